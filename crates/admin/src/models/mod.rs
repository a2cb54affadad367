//! Domain models for the approval workflow.
//!
//! Stored documents use camelCase field names. Proposal payloads are narrowed
//! into the `*Draft`/`*Changes` types here before anything touches a live
//! entity; those types reject unknown fields.

pub mod admin_user;
pub mod approval;
pub mod banner;
pub mod metal_rates;
pub mod product;

pub use admin_user::AdminIdentity;
pub use approval::{ApprovalFilter, ApprovalRecord, NewApproval};
pub use banner::{Banner, BannerChanges, BannerDraft};
pub use metal_rates::{CURRENT_RATES_ID, PriceHistoryEntry, RateChangeRequest};
pub use product::{Product, ProductChanges, ProductDraft};
