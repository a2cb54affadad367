//! Karat Admin library.
//!
//! Maker-checker approval workflow for the jewelry back office. Editors and
//! admins propose changes to products, metal rates and banners; a super-admin
//! approves or rejects each proposal, and approval applies the change to the
//! live collection in the same transaction that closes the ledger entry.
//!
//! This crate provides the service as a library, allowing it to be tested
//! and reused by the CLI.
//!
//! # Modules
//!
//! - [`db`] - Document store seam (`PostgreSQL` and in-memory backends)
//! - [`models`] - Ledger entries, admin identities and live entity shapes
//! - [`services`] - Ledger, entity adapters and the review coordinator
//! - [`routes`] - JSON API over axum

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
