//! CLI subcommand implementations.

pub mod admin;
pub mod approvals;
pub mod migrate;

use secrecy::SecretString;

/// Read the admin database URL, with the same `DATABASE_URL` fallback the
/// service uses.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
