//! Roles, Actors and Site Kinds

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::ids::ActorId;

/// Staff role.
///
/// Roles carry no behaviour of their own: what a role may do is looked up in
/// the [`ApprovalAuthority`](crate::authority::ApprovalAuthority) capability
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Top-level administrator.
    SuperAdmin,
    /// System administrator.
    Admin,
    /// Department manager.
    Manager,
    /// Warehouse manager.
    WarehouseManager,
    /// Dispatcher.
    Dispatcher,
    /// Cashier.
    Pos,
    /// Picker.
    Picker,
    /// Packer.
    Packer,
    /// Human resources.
    Hr,
    /// Auditor.
    Auditor,
    /// Driver.
    Driver,
    /// Finance manager.
    FinanceManager,
    /// Procurement manager.
    ProcurementManager,
    /// Store supervisor.
    StoreSupervisor,
    /// Inventory specialist.
    InventorySpecialist,
    /// Customer service manager.
    CsManager,
    /// IT support.
    ItSupport,
}

impl Role {
    /// Every known role.
    pub const ALL: [Role; 17] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Manager,
        Role::WarehouseManager,
        Role::Dispatcher,
        Role::Pos,
        Role::Picker,
        Role::Packer,
        Role::Hr,
        Role::Auditor,
        Role::Driver,
        Role::FinanceManager,
        Role::ProcurementManager,
        Role::StoreSupervisor,
        Role::InventorySpecialist,
        Role::CsManager,
        Role::ItSupport,
    ];

    /// Stable snake-case name, as stored and configured.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::WarehouseManager => "warehouse_manager",
            Role::Dispatcher => "dispatcher",
            Role::Pos => "pos",
            Role::Picker => "picker",
            Role::Packer => "packer",
            Role::Hr => "hr",
            Role::Auditor => "auditor",
            Role::Driver => "driver",
            Role::FinanceManager => "finance_manager",
            Role::ProcurementManager => "procurement_manager",
            Role::StoreSupervisor => "store_supervisor",
            Role::InventorySpecialist => "inventory_specialist",
            Role::CsManager => "cs_manager",
            Role::ItSupport => "it_support",
        }
    }

    /// Parse a stored role name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == name)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// The user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User id.
    pub id: ActorId,

    /// Display name, kept for notifications and audit entries.
    pub name: String,

    /// Role at the time of the operation.
    pub role: Role,
}

impl Actor {
    /// Create an actor.
    pub fn new(id: ActorId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }
}

/// Normalised kind of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    /// Headquarters and administrative offices. These never hold inventory.
    Administration,
    /// Warehouses and distribution centres.
    Warehouse,
    /// Retail stores, including dark stores.
    Store,
}

impl SiteKind {
    /// Classify a free-text site type ("HQ", "Distribution Center", "Dark Store", ...).
    ///
    /// Returns `None` when the text matches no known kind.
    #[must_use]
    pub fn classify(site_type: &str) -> Option<Self> {
        let lower = site_type.trim().to_lowercase();

        if lower == "hq"
            || lower.contains("headquarters")
            || lower.contains("administrati")
            || lower.contains("central operations")
        {
            return Some(Self::Administration);
        }

        if ["warehouse", "logistics", "storage", "distribution center"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            return Some(Self::Warehouse);
        }

        if ["store", "retail", "market", "grocery"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            return Some(Self::Store);
        }

        None
    }

    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SiteKind::Administration => "administration",
            SiteKind::Warehouse => "warehouse",
            SiteKind::Store => "store",
        }
    }
}

impl Display for SiteKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Which kind of site a role's records must live at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredSite {
    /// No restriction.
    #[default]
    Any,
    /// Administrative sites only.
    Administration,
    /// Warehouses only.
    Warehouse,
    /// Stores only.
    Store,
}

impl RequiredSite {
    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RequiredSite::Any => "any",
            RequiredSite::Administration => "administration",
            RequiredSite::Warehouse => "warehouse",
            RequiredSite::Store => "store",
        }
    }

    /// Whether a site of `kind` satisfies this requirement.
    #[must_use]
    pub const fn admits(self, kind: SiteKind) -> bool {
        matches!(
            (self, kind),
            (RequiredSite::Any, _)
                | (RequiredSite::Administration, SiteKind::Administration)
                | (RequiredSite::Warehouse, SiteKind::Warehouse)
                | (RequiredSite::Store, SiteKind::Store)
        )
    }
}
