//! Promotional banners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use karat_core::BannerId;

/// A live promotional banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    #[must_use]
    pub fn from_draft(id: BannerId, draft: BannerDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            image_url: draft.image_url,
            link_url: draft.link_url,
            sort_order: draft.sort_order,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload of a banner `create` proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BannerDraft {
    pub title: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl BannerDraft {
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        check_url("imageUrl", &self.image_url)?;
        if let Some(link) = &self.link_url {
            check_url("linkUrl", link)?;
        }
        Ok(())
    }
}

/// Payload of a banner `update` proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BannerChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl BannerChanges {
    /// # Errors
    ///
    /// Returns a description of the problem.
    pub fn validate(&self) -> Result<(), String> {
        if *self == Self::default() {
            return Err("update must change at least one field".to_string());
        }
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err("title must not be empty".to_string());
        }
        if let Some(url) = &self.image_url {
            check_url("imageUrl", url)?;
        }
        if let Some(url) = &self.link_url {
            check_url("linkUrl", url)?;
        }
        Ok(())
    }
}

fn check_url(field: &str, url: &str) -> Result<(), String> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(format!("{field} must be an http(s) URL"))
    }
}
