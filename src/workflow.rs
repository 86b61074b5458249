//! # Approval Workflow Rules
//!
//! Pure state-machine logic for approval documents: which step may be acted
//! on next, and how the document-level status derives from its step states.
//! The repository persists whatever these functions decide; the policy lives
//! here so it can be tested (and changed) in one place.

use crate::models::approval_step::{ApprovalType, StepStatus};
use crate::models::{DocumentStatus, approval_step};

/// Why a step decision was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("document is already in terminal status {0:?}")]
    DocumentTerminal(DocumentStatus),
    #[error("no pending step remains on this document")]
    NoPendingStep,
    #[error("the current step is assigned to a different approver")]
    NotAssignedApprover,
}

/// Derive the document status from its step states.
///
/// Blocking steps are APPROVE and REVIEW types; a rejection of either
/// rejects the document, and all of them must be approved for the document
/// to be APPROVED. NOTIFY steps never block. `cancelled` short-circuits to
/// CANCELLED (the drafter withdrew before a terminal status was reached).
pub fn derive_document_status(steps: &[approval_step::Model], cancelled: bool) -> DocumentStatus {
    if cancelled {
        return DocumentStatus::Cancelled;
    }

    let any_acted = steps.iter().any(|s| s.status != StepStatus::Pending);

    let blocking: Vec<&approval_step::Model> = steps
        .iter()
        .filter(|s| s.approval_type.is_blocking())
        .collect();

    if blocking
        .iter()
        .any(|s| s.status == StepStatus::Rejected)
    {
        return DocumentStatus::Rejected;
    }

    if !blocking.is_empty()
        && blocking
            .iter()
            .all(|s| s.status == StepStatus::Approved)
    {
        return DocumentStatus::Approved;
    }

    // Degenerate all-NOTIFY chain: approved as soon as anything is acted on.
    if blocking.is_empty() && any_acted {
        return DocumentStatus::Approved;
    }

    if any_acted {
        DocumentStatus::InProgress
    } else {
        DocumentStatus::Draft
    }
}

/// Find the step the given approver may act on right now.
///
/// Only the lowest-ordered PENDING step is actionable, and only by its
/// assigned approver. `steps` must be the document's full chain.
pub fn actionable_step<'a>(
    document_status: DocumentStatus,
    steps: &'a [approval_step::Model],
    approver_id: uuid::Uuid,
) -> Result<&'a approval_step::Model, StepError> {
    if document_status.is_terminal() {
        return Err(StepError::DocumentTerminal(document_status));
    }

    let current = steps
        .iter()
        .filter(|s| s.status == StepStatus::Pending)
        .min_by_key(|s| s.step_order)
        .ok_or(StepError::NoPendingStep)?;

    if current.approver_id != approver_id {
        return Err(StepError::NotAssignedApprover);
    }

    Ok(current)
}

/// Validate a submitted step chain at document creation.
///
/// Steps are immutable in composition after creation, so malformed chains
/// must be refused up front. Submission order is preserved; approvers are
/// deliberately not deduplicated.
pub fn validate_step_chain(approval_types: &[ApprovalType]) -> Result<(), &'static str> {
    if approval_types.is_empty() {
        return Err("an approval document requires at least one step");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn step(
        order: i32,
        approval_type: ApprovalType,
        status: StepStatus,
        approver: Uuid,
    ) -> approval_step::Model {
        approval_step::Model {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            step_order: order,
            approver_id: approver,
            approval_type,
            status,
            comment: None,
            acted_at: None,
        }
    }

    fn chain(specs: &[(ApprovalType, StepStatus)]) -> Vec<approval_step::Model> {
        specs
            .iter()
            .enumerate()
            .map(|(i, (t, s))| step(i as i32 + 1, *t, *s, Uuid::new_v4()))
            .collect()
    }

    #[test]
    fn untouched_chain_is_draft() {
        let steps = chain(&[
            (ApprovalType::Approve, StepStatus::Pending),
            (ApprovalType::Review, StepStatus::Pending),
        ]);
        assert_eq!(derive_document_status(&steps, false), DocumentStatus::Draft);
    }

    #[test]
    fn partially_acted_chain_is_in_progress() {
        let steps = chain(&[
            (ApprovalType::Approve, StepStatus::Approved),
            (ApprovalType::Approve, StepStatus::Pending),
        ]);
        assert_eq!(
            derive_document_status(&steps, false),
            DocumentStatus::InProgress
        );
    }

    #[test]
    fn all_blocking_approved_is_approved() {
        let steps = chain(&[
            (ApprovalType::Approve, StepStatus::Approved),
            (ApprovalType::Review, StepStatus::Approved),
            (ApprovalType::Notify, StepStatus::Pending),
        ]);
        assert_eq!(
            derive_document_status(&steps, false),
            DocumentStatus::Approved
        );
    }

    #[test]
    fn blocking_rejection_rejects_document() {
        let steps = chain(&[
            (ApprovalType::Approve, StepStatus::Approved),
            (ApprovalType::Review, StepStatus::Rejected),
            (ApprovalType::Approve, StepStatus::Pending),
        ]);
        assert_eq!(
            derive_document_status(&steps, false),
            DocumentStatus::Rejected
        );
    }

    #[test]
    fn notify_rejection_never_blocks() {
        let steps = chain(&[
            (ApprovalType::Approve, StepStatus::Approved),
            (ApprovalType::Notify, StepStatus::Rejected),
        ]);
        assert_eq!(
            derive_document_status(&steps, false),
            DocumentStatus::Approved
        );
    }

    #[test]
    fn cancelled_overrides_everything() {
        let steps = chain(&[(ApprovalType::Approve, StepStatus::Approved)]);
        assert_eq!(
            derive_document_status(&steps, true),
            DocumentStatus::Cancelled
        );
    }

    #[test]
    fn all_notify_chain_approves_on_first_action() {
        let pending = chain(&[(ApprovalType::Notify, StepStatus::Pending)]);
        assert_eq!(
            derive_document_status(&pending, false),
            DocumentStatus::Draft
        );

        let acted = chain(&[(ApprovalType::Notify, StepStatus::Approved)]);
        assert_eq!(
            derive_document_status(&acted, false),
            DocumentStatus::Approved
        );
    }

    #[test]
    fn actionable_step_is_lowest_pending_for_its_approver() {
        let approver = Uuid::new_v4();
        let other = Uuid::new_v4();
        let steps = vec![
            step(1, ApprovalType::Approve, StepStatus::Approved, other),
            step(2, ApprovalType::Approve, StepStatus::Pending, approver),
            step(3, ApprovalType::Review, StepStatus::Pending, other),
        ];

        let current = actionable_step(DocumentStatus::InProgress, &steps, approver).unwrap();
        assert_eq!(current.step_order, 2);

        // The third approver must wait for step 2.
        assert_eq!(
            actionable_step(DocumentStatus::InProgress, &steps, other),
            Err(StepError::NotAssignedApprover)
        );
    }

    #[test]
    fn terminal_document_refuses_decisions() {
        let approver = Uuid::new_v4();
        let steps = vec![step(1, ApprovalType::Approve, StepStatus::Pending, approver)];
        assert_eq!(
            actionable_step(DocumentStatus::Approved, &steps, approver),
            Err(StepError::DocumentTerminal(DocumentStatus::Approved))
        );
        assert_eq!(
            actionable_step(DocumentStatus::Cancelled, &steps, approver),
            Err(StepError::DocumentTerminal(DocumentStatus::Cancelled))
        );
    }

    #[test]
    fn fully_acted_document_has_no_pending_step() {
        let approver = Uuid::new_v4();
        let steps = vec![step(1, ApprovalType::Approve, StepStatus::Approved, approver)];
        assert_eq!(
            actionable_step(DocumentStatus::InProgress, &steps, approver),
            Err(StepError::NoPendingStep)
        );
    }

    #[test]
    fn empty_step_chain_is_refused() {
        assert!(validate_step_chain(&[]).is_err());
        assert!(validate_step_chain(&[ApprovalType::Approve]).is_ok());
    }
}
