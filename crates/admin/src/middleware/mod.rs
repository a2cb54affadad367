//! HTTP middleware and extractors for admin.
//!
//! The service sits behind the back-office gateway, which authenticates the
//! operator and forwards their uid in the `x-admin-uid` header. Everything
//! past that (active flag, role, capabilities) is resolved per request from
//! the `admin_users` collection.

pub mod auth;

pub use auth::{ADMIN_UID_HEADER, Caller};
