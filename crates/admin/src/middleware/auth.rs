//! Caller extraction for admin routes.

use axum::{extract::FromRequestParts, http::request::Parts};

use karat_core::AdminUid;

use crate::error::set_sentry_user;

/// Header carrying the authenticated operator's uid.
pub const ADMIN_UID_HEADER: &str = "x-admin-uid";

/// Extractor for the calling operator's uid, if the gateway supplied one.
///
/// Never rejects: a missing, blank or non-UTF-8 header yields `Caller(None)`,
/// which the workflow turns into `Unauthenticated`.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(caller: Caller) -> impl IntoResponse {
///     match caller.uid() {
///         Some(uid) => format!("Hello, {uid}!"),
///         None => "Hello, stranger!".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Option<AdminUid>);

impl Caller {
    #[must_use]
    pub const fn uid(&self) -> Option<&AdminUid> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uid = parts
            .headers
            .get(ADMIN_UID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(AdminUid::new);

        if let Some(uid) = &uid {
            set_sentry_user(uid.as_str());
        }

        Ok(Self(uid))
    }
}
