// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Standard permissions and field policies
//!
//! The deployment's capability hierarchy, declared as data. `Manage` is a
//! strict subset of `Administer`: everything that can run host commands,
//! change executors or edit administer-only settings stays behind
//! `Administer`.
//!
//! `Manage` and `SystemRead` exist only when the matching [`CatalogFlags`]
//! are set. While disabled, their grants are inert and checks for them fall
//! through to `Administer`.

use crate::error::Result;
use crate::field::{EntityPolicy, EntityType, FieldAuthorizationIndex, FieldRecord};
use crate::permission::{Permission, PermissionGraph, PermissionId};
use serde::{Deserialize, Serialize};

/// Full control over the system
pub const ADMINISTER: PermissionId = PermissionId::from_static("Overall", "Administer");
/// Manage-safe subset of administration
pub const MANAGE: PermissionId = PermissionId::from_static("Overall", "Manage");
/// Read-only view of system configuration
pub const SYSTEM_READ: PermissionId = PermissionId::from_static("Overall", "SystemRead");
/// Basic read access
pub const READ: PermissionId = PermissionId::from_static("Overall", "Read");
/// Run arbitrary scripts on the controller
pub const RUN_SCRIPTS: PermissionId = PermissionId::from_static("Overall", "RunScripts");
/// Upload plugin archives
pub const UPLOAD_PLUGINS: PermissionId = PermissionId::from_static("Overall", "UploadPlugins");
/// Configure update sites
pub const CONFIGURE_UPDATE_CENTER: PermissionId =
    PermissionId::from_static("Overall", "ConfigureUpdateCenter");

/// Configure a computer
pub const COMPUTER_CONFIGURE: PermissionId = PermissionId::from_static("Computer", "Configure");
/// Read a computer's configuration
pub const COMPUTER_EXTENDED_READ: PermissionId =
    PermissionId::from_static("Computer", "ExtendedRead");
/// Connect an agent
pub const COMPUTER_CONNECT: PermissionId = PermissionId::from_static("Computer", "Connect");

/// Configure an item
pub const ITEM_CONFIGURE: PermissionId = PermissionId::from_static("Item", "Configure");
/// Read an item's configuration
pub const ITEM_EXTENDED_READ: PermissionId = PermissionId::from_static("Item", "ExtendedRead");
/// Trigger a build
pub const ITEM_BUILD: PermissionId = PermissionId::from_static("Item", "Build");
/// See an item
pub const ITEM_READ: PermissionId = PermissionId::from_static("Item", "Read");

/// Configure a view
pub const VIEW_CONFIGURE: PermissionId = PermissionId::from_static("View", "Configure");
/// See a view
pub const VIEW_READ: PermissionId = PermissionId::from_static("View", "Read");

/// Entity type of the global system configuration form
pub const GLOBAL_CONFIGURATION: EntityType = EntityType::from_static("global-configuration");

/// Deployment feature flags controlling optional permissions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFlags {
    /// Enable `Overall/Manage`
    #[serde(default)]
    pub manage_permission: bool,
    /// Enable `Overall/SystemRead`
    #[serde(default)]
    pub system_read_permission: bool,
}

impl CatalogFlags {
    /// Flags with `Overall/Manage` enabled
    #[must_use]
    pub const fn with_manage() -> Self {
        Self {
            manage_permission: true,
            system_read_permission: false,
        }
    }
}

/// Standard permission declarations for `flags`
#[must_use]
pub fn standard_permissions(flags: CatalogFlags) -> Vec<Permission> {
    vec![
        Permission::new(ADMINISTER, "Full control over the system"),
        Permission::new(MANAGE, "Configure manage-safe system settings")
            .with_implied_by(ADMINISTER)
            .with_enabled(flags.manage_permission),
        Permission::new(SYSTEM_READ, "Read system configuration")
            .with_implied_by(ADMINISTER)
            .with_enabled(flags.system_read_permission),
        Permission::new(READ, "Read access").with_implied_by(ADMINISTER),
        Permission::new(RUN_SCRIPTS, "Run scripts on the controller").with_implied_by(ADMINISTER),
        Permission::new(UPLOAD_PLUGINS, "Upload plugins").with_implied_by(ADMINISTER),
        Permission::new(CONFIGURE_UPDATE_CENTER, "Configure update sites")
            .with_implied_by(ADMINISTER),
        Permission::new(COMPUTER_CONFIGURE, "Configure computers").with_implied_by(ADMINISTER),
        Permission::new(COMPUTER_EXTENDED_READ, "Read computer configuration")
            .with_implied_by(COMPUTER_CONFIGURE),
        Permission::new(COMPUTER_CONNECT, "Connect agents").with_implied_by(ADMINISTER),
        Permission::new(ITEM_CONFIGURE, "Configure items").with_implied_by(ADMINISTER),
        Permission::new(ITEM_EXTENDED_READ, "Read item configuration")
            .with_implied_by(ITEM_CONFIGURE),
        Permission::new(ITEM_BUILD, "Build items").with_implied_by(ADMINISTER),
        Permission::new(ITEM_READ, "Read items").with_implied_by(ADMINISTER),
        Permission::new(VIEW_CONFIGURE, "Configure views").with_implied_by(ADMINISTER),
        Permission::new(VIEW_READ, "Read views").with_implied_by(ADMINISTER),
    ]
}

/// Build the standard permission graph
///
/// # Errors
///
/// Only if the declarations above are inconsistent; callers treat this as
/// fatal at start-up.
pub fn standard_graph(flags: CatalogFlags) -> Result<PermissionGraph> {
    PermissionGraph::builder()
        .register_all(standard_permissions(flags))
        .build()
}

/// Field policy of the global system configuration
///
/// The form opens with `Manage`; only the manage-safe fields are visible
/// with it. Everything touching executors, views, shells, node properties or
/// administrative monitors stays administer-only.
#[must_use]
pub fn global_configuration_policy() -> EntityPolicy {
    let admin_only = |field: &str, label: &str| {
        FieldRecord::new(field, label, ADMINISTER, ADMINISTER)
    };
    let manage = |field: &str, label: &str| FieldRecord::new(field, label, MANAGE, MANAGE);

    EntityPolicy::new(GLOBAL_CONFIGURATION, MANAGE)
        .field(admin_only("systemMessage", "System message"))
        .field(admin_only("useProjectNamingStrategy", "Restrict project naming"))
        .field(admin_only("primaryView", "Default view"))
        .field(admin_only("numExecutors", "# of executors"))
        .field(admin_only("globalNodeProperties", "Global properties"))
        .field(admin_only("administrativeMonitors", "Administrative monitors"))
        .field(admin_only("shell", "Shell executable"))
        .field(manage("quietPeriod", "Quiet period"))
        .field(manage("scmCheckoutRetryCount", "SCM checkout retry count"))
        .field(manage("rootUrl", "Root URL"))
        .field(manage("adminAddress", "System admin e-mail address"))
        .field(FieldRecord::new(
            "markupFormatter",
            "Markup formatter",
            MANAGE,
            ADMINISTER,
        ))
}

/// Build the standard field authorization index against `graph`
///
/// # Errors
///
/// `InconsistentFieldPolicy` or `UnknownPermission` if the declarations do
/// not fit the graph
pub fn standard_field_index(graph: &PermissionGraph) -> Result<FieldAuthorizationIndex> {
    FieldAuthorizationIndex::builder()
        .entity(global_configuration_policy())
        .build(graph)
}
