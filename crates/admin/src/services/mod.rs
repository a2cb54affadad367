//! Workflow services.
//!
//! # Services
//!
//! - `identity` - caller resolution against `admin_users`
//! - `ledger` - approval ledger and its state machine
//! - `adapters` - per-entity apply/cleanup rules
//! - `review` - propose/review orchestration

pub mod adapters;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod review;

pub use adapters::{AdapterRegistry, EntityAdapter};
pub use error::WorkflowError;
pub use identity::IdentityResolver;
pub use ledger::ApprovalLedger;
pub use review::{
    DIRECT_APPLY_NOTE, ProposalOutcome, ReviewCoordinator, ReviewOutcome, WorkflowPolicy,
};
