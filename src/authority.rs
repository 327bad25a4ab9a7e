//! Approval Authority
//!
//! A single role → capability table decides who may apply changes directly,
//! who may review queued changes, and which kinds of site a role's products
//! belong at. Nothing else in the crate inspects roles.
//!
//! The table is configuration. [`ApprovalAuthority::default`] carries the
//! built-in rules; deployments can supply their own as YAML:
//!
//! ```yaml
//! roles:
//!   - role: super_admin
//!     approver: true
//!   - role: admin
//!     auto_approve: [create]
//!   - role: warehouse_manager
//!     site: warehouse
//! ```

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

use crate::{
    requests::ChangeKind,
    roles::{RequiredSite, Role, SiteKind},
};

/// Capability table loading errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// IO error reading the policy file
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse policy YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// The same role appears twice
    #[error("role {0} is listed more than once")]
    DuplicateRole(Role),
}

/// What one role may do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleCapabilities {
    /// Applies every kind of change directly and reviews queued requests.
    pub approver: bool,

    /// Change kinds applied directly without review.
    pub auto_approve: SmallVec<[ChangeKind; 4]>,

    /// Kind of site this role's products must live at.
    pub site: RequiredSite,
}

/// Outcome of a site assignment check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteAssignment {
    /// The assignment is acceptable.
    Ok,
    /// The assignment breaks policy; the message explains how.
    Violation(String),
}

impl SiteAssignment {
    /// Whether the assignment is acceptable.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, SiteAssignment::Ok)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    roles: Vec<RoleEntry>,
}

#[derive(Debug, Deserialize)]
struct RoleEntry {
    role: Role,

    #[serde(flatten)]
    capabilities: RoleCapabilities,
}

/// Role → capability table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalAuthority {
    table: FxHashMap<Role, RoleCapabilities>,
}

impl Default for ApprovalAuthority {
    /// Only `super_admin` reviews; `admin` and `hr` may create products
    /// directly; warehouse and store roles are tied to their site kind.
    fn default() -> Self {
        let mut table = FxHashMap::default();

        table.insert(
            Role::SuperAdmin,
            RoleCapabilities {
                approver: true,
                ..RoleCapabilities::default()
            },
        );

        for role in [Role::Admin, Role::Hr] {
            table.insert(
                role,
                RoleCapabilities {
                    auto_approve: smallvec![ChangeKind::Create],
                    ..RoleCapabilities::default()
                },
            );
        }

        for role in [
            Role::WarehouseManager,
            Role::Dispatcher,
            Role::Picker,
            Role::Packer,
            Role::Driver,
        ] {
            table.insert(
                role,
                RoleCapabilities {
                    site: RequiredSite::Warehouse,
                    ..RoleCapabilities::default()
                },
            );
        }

        for role in [Role::StoreSupervisor, Role::Pos, Role::InventorySpecialist] {
            table.insert(
                role,
                RoleCapabilities {
                    site: RequiredSite::Store,
                    ..RoleCapabilities::default()
                },
            );
        }

        Self { table }
    }
}

impl ApprovalAuthority {
    /// Build a table from explicit entries. Roles left out have no capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::DuplicateRole`] if a role is listed twice.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Role, RoleCapabilities)>,
    ) -> Result<Self, PolicyError> {
        let mut table = FxHashMap::default();

        for (role, capabilities) in entries {
            if table.insert(role, capabilities).is_some() {
                return Err(PolicyError::DuplicateRole(role));
            }
        }

        Ok(Self { table })
    }

    /// Parse a YAML capability table.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or lists a role twice.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PolicyError> {
        let file: PolicyFile = serde_norway::from_str(yaml)?;

        Self::from_entries(
            file.roles
                .into_iter()
                .map(|entry| (entry.role, entry.capabilities)),
        )
    }

    /// Load a YAML capability table from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }

    /// Capabilities configured for `role`, if any.
    #[must_use]
    pub fn capabilities(&self, role: Role) -> Option<&RoleCapabilities> {
        self.table.get(&role)
    }

    /// Whether `role` sits in the approver tier: it applies every change
    /// directly and may approve or reject queued requests.
    #[must_use]
    pub fn can_auto_approve(&self, role: Role) -> bool {
        self.capabilities(role).is_some_and(|caps| caps.approver)
    }

    /// Whether a change of `kind` proposed by `role` skips the queue.
    #[must_use]
    pub fn can_auto_approve_change(&self, role: Role, kind: ChangeKind) -> bool {
        self.capabilities(role)
            .is_some_and(|caps| caps.approver || caps.auto_approve.contains(&kind))
    }

    /// Check that a product proposed by `role` may live at a site of `kind`.
    #[must_use]
    pub fn validate_site_assignment(&self, role: Role, kind: SiteKind) -> SiteAssignment {
        if kind == SiteKind::Administration {
            return SiteAssignment::Violation(
                "administrative sites do not hold inventory; choose a warehouse or store"
                    .to_string(),
            );
        }

        let required = self
            .capabilities(role)
            .map_or(RequiredSite::Any, |caps| caps.site);

        if required.admits(kind) {
            SiteAssignment::Ok
        } else {
            SiteAssignment::Violation(format!(
                "{role} products belong at a {} site, not a {kind} site",
                required.as_str()
            ))
        }
    }

    /// Every role with the approver capability.
    #[must_use]
    pub fn approvers(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .table
            .iter()
            .filter(|(_, caps)| caps.approver)
            .map(|(role, _)| *role)
            .collect();

        roles.sort_unstable();
        roles
    }
}
