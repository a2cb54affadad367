//! Karat Core - Shared types library.
//!
//! This crate provides the domain vocabulary shared by every Karat component:
//! - `admin` - Approval workflow service (ledger, adapters, review coordinator)
//! - `cli` - Command-line tools for migrations and operator tasks
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, emails, roles, approval enums and metal rate sheets

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
