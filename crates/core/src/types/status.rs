//! Roles, capability flags and status enums for the approval workflow.
//!
//! The string forms produced by `Display`/`as_str` are exactly the values
//! persisted in documents, so they must stay stable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Admin role with different trust tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Reviewer tier. Holds every capability and may approve or reject proposals.
    SuperAdmin,
    /// Store manager. Changes to governed entities are held for review.
    Admin,
    /// Content editor. Changes to governed entities are held for review.
    Editor,
}

impl AdminRole {
    /// Whether mutations proposed by this role must wait for a reviewer.
    #[must_use]
    pub const fn requires_review(self) -> bool {
        !matches!(self, Self::SuperAdmin)
    }

    /// Whether this role may decide on proposals.
    #[must_use]
    pub const fn can_review(self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Editor => "editor",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

/// Capability flag carried on an admin identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageProducts,
    ManageRates,
    ManageBanners,
    ViewApprovals,
}

impl Permission {
    /// Every capability flag, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::ManageProducts,
        Self::ManageRates,
        Self::ManageBanners,
        Self::ViewApprovals,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageProducts => "manage_products",
            Self::ManageRates => "manage_rates",
            Self::ManageBanners => "manage_banners",
            Self::ViewApprovals => "view_approvals",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("invalid permission: {s}"))
    }
}

/// Kind of live entity governed by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Product,
    MetalRates,
    Banner,
}

impl EntityType {
    pub const ALL: [Self; 3] = [Self::Product, Self::MetalRates, Self::Banner];

    /// Actions a proposal against this entity kind may carry.
    #[must_use]
    pub const fn allowed_actions(self) -> &'static [ActionType] {
        match self {
            Self::Product => &[
                ActionType::Create,
                ActionType::Update,
                ActionType::Archive,
                ActionType::Restore,
            ],
            Self::MetalRates => &[ActionType::Update],
            Self::Banner => &[ActionType::Create, ActionType::Update, ActionType::Delete],
        }
    }

    #[must_use]
    pub fn supports(self, action: ActionType) -> bool {
        self.allowed_actions().contains(&action)
    }

    /// Capability a submitter needs to propose changes to this entity kind.
    #[must_use]
    pub const fn required_permission(self) -> Permission {
        match self {
            Self::Product => Permission::ManageProducts,
            Self::MetalRates => Permission::ManageRates,
            Self::Banner => Permission::ManageBanners,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::MetalRates => "metalRates",
            Self::Banner => "banner",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("invalid entity type: {s}"))
    }
}

/// Mutation carried by a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Create,
    Update,
    Archive,
    Restore,
    Delete,
}

impl ActionType {
    /// Whether the proposal must reference an existing live entity.
    #[must_use]
    pub const fn requires_entity_id(self) -> bool {
        !matches!(self, Self::Create)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Archive => "archive",
            Self::Restore => "restore",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "archive" => Ok(Self::Archive),
            "restore" => Ok(Self::Restore),
            "delete" => Ok(Self::Delete),
            _ => Err(format!("invalid action type: {s}")),
        }
    }
}

/// Ledger entry status.
///
/// `Pending` is the only initial state; `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected)
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid approval status: {s}")),
        }
    }
}

/// A reviewer's decision on a pending proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// The terminal ledger status this decision produces.
    #[must_use]
    pub const fn status(self) -> ApprovalStatus {
        match self {
            Self::Approved => ApprovalStatus::Approved,
            Self::Rejected => ApprovalStatus::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().as_str())
    }
}

/// Catalog status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    ComingSoon,
    Draft,
    Archived,
    PendingApproval,
}

impl ProductStatus {
    /// Statuses under which a product is visible in the storefront.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Active | Self::ComingSoon)
    }
}

/// Approval marker carried by a product while a proposal targets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductApprovalStatus {
    PendingApproval,
    PendingUpdate,
    Approved,
    Rejected,
}

/// Precious metal a product is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetalType {
    Gold,
    Silver,
    Platinum,
}
