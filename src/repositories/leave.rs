//! # Leave Repository
//!
//! Batch approval/rejection of leave requests. All requested leaves are
//! prefetched in one query; each item then gets its own transaction so one
//! failure never poisons the rest of the batch. Approval decrements the
//! employee's yearly balance with a guarded atomic update, so the balance
//! can never go negative even under concurrent batches.

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditSink, NewNotification, RequestActor};
use crate::error::{self, ApiError};
use crate::models::{LeaveStatus, employee, leave, leave_balance};

/// Batch decision verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveAction {
    Approve,
    Reject,
}

impl LeaveAction {
    fn target_status(self) -> LeaveStatus {
        match self {
            Self::Approve => LeaveStatus::Approved,
            Self::Reject => LeaveStatus::Rejected,
        }
    }

    fn audit_verb(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
        }
    }
}

/// Aggregate result of a batch; individual failures are counted, not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, ToSchema)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub fail_count: usize,
}

pub struct LeaveRepository {
    db: DatabaseConnection,
}

impl LeaveRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Process a batch of leave decisions.
    ///
    /// Unknown ids, leaves no longer in REQUESTED status, and approvals
    /// without sufficient balance count as failures; everything else is
    /// committed item by item. Audit entries and employee notifications
    /// are emitted best-effort per successful item.
    pub async fn batch_process(
        &self,
        actor: &RequestActor,
        sink: &AuditSink,
        ids: &[Uuid],
        action: LeaveAction,
    ) -> Result<BatchOutcome, ApiError> {
        if ids.is_empty() {
            return Err(error::validation_error(
                "At least one leave id is required",
                json!({ "ids": "must not be empty" }),
            ));
        }

        let prefetched: HashMap<Uuid, leave::Model> = leave::Entity::find()
            .filter(leave::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        // One lookup for notification routing instead of one per item.
        let employee_users: HashMap<Uuid, Option<Uuid>> = {
            let employee_ids: Vec<Uuid> =
                prefetched.values().map(|l| l.employee_id).collect();
            if employee_ids.is_empty() {
                HashMap::new()
            } else {
                employee::Entity::find()
                    .filter(employee::Column::Id.is_in(employee_ids))
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(|e| (e.id, e.user_id))
                    .collect()
            }
        };

        let mut success_count = 0;
        let mut fail_count = 0;

        for id in ids {
            let Some(row) = prefetched.get(id) else {
                fail_count += 1;
                continue;
            };
            if row.status != LeaveStatus::Requested {
                fail_count += 1;
                continue;
            }

            match self.process_one(row, action).await {
                Ok(processed) => {
                    success_count += 1;

                    sink.record(
                        actor,
                        AuditEntry {
                            action: action.audit_verb().to_string(),
                            table_name: "leaves".to_string(),
                            record_id: Some(processed.id.to_string()),
                            old_value: Some(json!({ "status": LeaveStatus::Requested })),
                            new_value: Some(json!({ "status": processed.status })),
                        },
                    );

                    if let Some(Some(user_id)) = employee_users.get(&processed.employee_id) {
                        let verdict = match action {
                            LeaveAction::Approve => "approved",
                            LeaveAction::Reject => "rejected",
                        };
                        sink.notify(NewNotification {
                            user_id: *user_id,
                            notification_type: "LEAVE".to_string(),
                            title: format!("Leave request {}", verdict),
                            message: format!(
                                "Your leave from {} to {} has been {}",
                                processed.start_date, processed.end_date, verdict
                            ),
                            related_url: Some(format!("/hr/leaves/{}", processed.id)),
                        });
                    }
                }
                Err(err) => {
                    fail_count += 1;
                    tracing::warn!(leave_id = %id, error = %err.message, "leave batch item failed");
                }
            }
        }

        Ok(BatchOutcome {
            success_count,
            fail_count,
        })
    }

    /// Decide a single leave inside its own transaction.
    ///
    /// Both the balance decrement and the status flip are guarded updates
    /// re-checked against the live row; a stale prefetch simply makes the
    /// item fail.
    async fn process_one(
        &self,
        row: &leave::Model,
        action: LeaveAction,
    ) -> Result<leave::Model, ApiError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let new_status = action.target_status();

        if action == LeaveAction::Approve {
            let year = row.start_date.year();
            let result = leave_balance::Entity::update_many()
                .col_expr(
                    leave_balance::Column::UsedDays,
                    Expr::col(leave_balance::Column::UsedDays).add(row.days),
                )
                .col_expr(
                    leave_balance::Column::RemainingDays,
                    Expr::col(leave_balance::Column::RemainingDays).sub(row.days),
                )
                .filter(leave_balance::Column::EmployeeId.eq(row.employee_id))
                .filter(leave_balance::Column::Year.eq(year))
                .filter(leave_balance::Column::RemainingDays.gte(row.days))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                txn.rollback().await?;
                return Err(error::conflict("Insufficient leave balance"));
            }
        }

        let result = leave::Entity::update_many()
            .col_expr(leave::Column::Status, Expr::value(new_status))
            .col_expr(
                leave::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .filter(leave::Column::Id.eq(row.id))
            .filter(leave::Column::Status.eq(LeaveStatus::Requested))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(error::conflict("Leave is no longer in REQUESTED status"));
        }

        txn.commit().await?;

        Ok(leave::Model {
            status: new_status,
            updated_at: now.into(),
            ..row.clone()
        })
    }
}
