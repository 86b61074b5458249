//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access.

pub mod approval;
pub mod doc_sequence;
pub mod leave;
pub mod notification;
pub mod role;
pub mod session;

pub use approval::{ApprovalRepository, CreateDocumentRequest, Decision, DecisionOutcome, StepSpec};
pub use doc_sequence::DocSequenceRepository;
pub use leave::{BatchOutcome, LeaveAction, LeaveRepository};
pub use notification::NotificationRepository;
pub use role::RoleRepository;
pub use session::{SessionIdentity, SessionRepository};
