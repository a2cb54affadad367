//! Core types for Karat.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod rates;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use rates::{MetalRates, RateError};
pub use status::*;
