//! Integration tests for the authorization strategies

use core_identity::Principal;
use core_policy::catalog::{
    standard_graph, CatalogFlags, ADMINISTER, COMPUTER_CONFIGURE, COMPUTER_EXTENDED_READ,
    ITEM_BUILD, ITEM_READ, MANAGE, READ, RUN_SCRIPTS, SYSTEM_READ, UPLOAD_PLUGINS,
};
use core_policy::{
    AuthorizationStrategy, Decision, FullControlOnceLoggedIn, GrantSetBuilder, GrantSnapshot,
    GrantTable, GrantTableStrategy, PermissionGraph, PermissionId, PolicyError, ResourceKind,
    ResourceNode, Scope, SnapshotAuthorizer, Unsecured,
};
use std::sync::Arc;

fn graph(flags: CatalogFlags) -> Arc<PermissionGraph> {
    Arc::new(standard_graph(flags).unwrap())
}

fn fixture_snapshot(graph: &PermissionGraph) -> GrantSnapshot {
    GrantSetBuilder::new()
        .grant([ADMINISTER])
        .to_user("admin")
        .grant([MANAGE, READ])
        .to_user("manager")
        .grant([READ])
        .to_user("reader")
        .build(graph)
        .unwrap()
}

fn user(name: &str) -> Principal {
    Principal::new(name).unwrap()
}

#[test]
fn test_manage_never_implies_administer() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = fixture_snapshot(&graph);
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let root = ResourceNode::root();

    let manager = user("manager");
    assert!(auth.has_permission(&manager, &root, &MANAGE).unwrap());
    assert!(auth.has_permission(&manager, &root, &READ).unwrap());
    assert!(!auth.has_permission(&manager, &root, &ADMINISTER).unwrap());
    assert!(!auth.has_permission(&manager, &root, &RUN_SCRIPTS).unwrap());
    assert!(!auth.has_permission(&manager, &root, &UPLOAD_PLUGINS).unwrap());
    assert!(!auth.has_permission(&manager, &root, &COMPUTER_CONFIGURE).unwrap());
}

#[test]
fn test_administer_implies_every_permission() {
    let graph = graph(CatalogFlags {
        manage_permission: true,
        system_read_permission: true,
    });
    let snapshot = fixture_snapshot(&graph);
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let root = ResourceNode::root();
    let admin = user("admin");

    for permission in graph.permissions() {
        assert!(
            auth.has_permission(&admin, &root, permission.id()).unwrap(),
            "admin should hold {}",
            permission.id()
        );
    }
}

#[test]
fn test_reader_holds_only_read() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = fixture_snapshot(&graph);
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let root = ResourceNode::root();
    let reader = user("reader");

    assert!(auth.has_permission(&reader, &root, &READ).unwrap());
    assert!(!auth.has_permission(&reader, &root, &MANAGE).unwrap());
    assert!(!auth.has_permission(&reader, &root, &ADMINISTER).unwrap());
}

#[test]
fn test_unknown_principal_is_denied() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = fixture_snapshot(&graph);
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);

    let nobody = user("nobody");
    assert!(!auth
        .has_permission(&nobody, &ResourceNode::root(), &READ)
        .unwrap());
    assert!(!auth
        .has_permission(&Principal::anonymous(), &ResourceNode::root(), &READ)
        .unwrap());
}

#[test]
fn test_empty_snapshot_denies_everything() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = GrantSnapshot::empty();
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let admin = user("admin");

    for permission in graph.permissions() {
        assert!(!auth
            .has_permission(&admin, &ResourceNode::root(), permission.id())
            .unwrap());
    }
}

#[test]
fn test_disabled_manage_grant_is_inert() {
    let graph = graph(CatalogFlags::default());
    let snapshot = fixture_snapshot(&graph);
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let root = ResourceNode::root();

    // The grant is accepted but confers nothing of its own
    let manager = user("manager");
    assert!(!auth.has_permission(&manager, &root, &MANAGE).unwrap());
    assert!(auth.has_permission(&manager, &root, &READ).unwrap());

    // Checks for the disabled permission escalate to Administer
    let admin = user("admin");
    assert!(auth.has_permission(&admin, &root, &MANAGE).unwrap());
}

#[test]
fn test_disabled_system_read_escalates() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = GrantSetBuilder::new()
        .grant([SYSTEM_READ])
        .to_user("auditor")
        .grant([ADMINISTER])
        .to_user("admin")
        .build(&graph)
        .unwrap();
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let root = ResourceNode::root();

    assert!(!auth.has_permission(&user("auditor"), &root, &SYSTEM_READ).unwrap());
    assert!(auth.has_permission(&user("admin"), &root, &SYSTEM_READ).unwrap());
}

#[test]
fn test_group_and_everyone_grants() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = GrantSetBuilder::new()
        .grant([MANAGE])
        .to_group("operators")
        .grant([READ])
        .to_everyone()
        .build(&graph)
        .unwrap();
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let root = ResourceNode::root();

    let operator = user("olivia").with_group("operators").unwrap();
    let outsider = user("oscar").with_group("developers").unwrap();

    assert!(auth.has_permission(&operator, &root, &MANAGE).unwrap());
    assert!(!auth.has_permission(&outsider, &root, &MANAGE).unwrap());
    assert!(auth.has_permission(&outsider, &root, &READ).unwrap());
    assert!(auth
        .has_permission(&Principal::anonymous(), &root, &READ)
        .unwrap());
}

#[test]
fn test_resource_scoped_grant() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = GrantSetBuilder::new()
        .grant([ITEM_BUILD])
        .on("job/nightly")
        .to_user("dev")
        .build(&graph)
        .unwrap();
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let dev = user("dev");

    let nightly = ResourceNode::new(ResourceKind::Item, "job/nightly");
    let release = ResourceNode::new(ResourceKind::Item, "job/release");

    assert!(auth.has_permission(&dev, &nightly, &ITEM_BUILD).unwrap());
    assert!(!auth.has_permission(&dev, &release, &ITEM_BUILD).unwrap());
    assert!(!auth
        .has_permission(&dev, &ResourceNode::root(), &ITEM_BUILD)
        .unwrap());
    // A build grant does not imply reading the item
    assert!(!auth.has_permission(&dev, &nightly, &ITEM_READ).unwrap());
}

#[test]
fn test_delegating_resource_uses_owner_grants() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = GrantSetBuilder::new()
        .grant([MANAGE])
        .on("job/folder")
        .to_user("lead")
        .grant([ADMINISTER])
        .to_user("admin")
        .build(&graph)
        .unwrap();
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);

    let root = Arc::new(ResourceNode::root());
    let folder = Arc::new(ResourceNode::new(ResourceKind::Item, "job/folder"));
    let job = ResourceNode::new(ResourceKind::Item, "job/folder/app").delegating_to(folder);
    let plugin = ResourceNode::new(ResourceKind::Plugin, "plugin/git").delegating_to(root);

    // Grants on the owning resource apply to the delegating one
    assert!(auth.has_permission(&user("lead"), &job, &MANAGE).unwrap());
    // The plugin defers to the root, where only Administer holds
    assert!(!auth.has_permission(&user("lead"), &plugin, &ADMINISTER).unwrap());
    assert!(auth.has_permission(&user("admin"), &plugin, &ADMINISTER).unwrap());
}

#[test]
fn test_implication_below_non_root_permission() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = GrantSetBuilder::new()
        .grant([COMPUTER_CONFIGURE])
        .to_user("ops")
        .build(&graph)
        .unwrap();
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let agent = ResourceNode::new(ResourceKind::Computer, "computer/agent-1");
    let ops = user("ops");

    assert!(auth.has_permission(&ops, &agent, &COMPUTER_EXTENDED_READ).unwrap());
    assert!(!auth.has_permission(&ops, &agent, &ADMINISTER).unwrap());
}

#[test]
fn test_unknown_permission_is_an_error() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = fixture_snapshot(&graph);
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let bogus = PermissionId::new("Overall", "Bogus");

    let result = auth.has_permission(&user("admin"), &ResourceNode::root(), &bogus);
    assert!(matches!(result, Err(PolicyError::UnknownPermission(id)) if id == bogus));
}

#[test]
fn test_matching_grants_explain_decision() {
    let graph = graph(CatalogFlags::with_manage());
    let snapshot = GrantSetBuilder::new()
        .grant([ADMINISTER])
        .to_group("admins")
        .grant([READ])
        .to_everyone()
        .grant([ITEM_BUILD])
        .on("job/nightly")
        .to_user("root")
        .build(&graph)
        .unwrap();
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let root_user = user("root").with_group("admins").unwrap();

    let grants = auth
        .matching_grants(&root_user, &ResourceNode::root(), &READ)
        .unwrap();
    let permissions: Vec<_> = grants.iter().map(|g| g.permission.clone()).collect();
    assert_eq!(permissions, vec![ADMINISTER, READ]);
    assert!(grants.iter().all(|g| g.scope == Scope::Everywhere));

    let grants = auth
        .matching_grants(&user("someone"), &ResourceNode::root(), &MANAGE)
        .unwrap();
    assert!(grants.is_empty());
    assert_eq!(auth.grant_count(), 3);
}

#[test]
fn test_check_returns_decision() {
    let graph = graph(CatalogFlags::with_manage());
    let table = Arc::new(GrantTable::new(fixture_snapshot(&graph)));
    let strategy = GrantTableStrategy::new(Arc::clone(&graph), table);
    let root = ResourceNode::root();

    assert_eq!(
        strategy.check(&user("manager"), &root, &MANAGE).unwrap(),
        Decision::Granted
    );
    assert_eq!(
        strategy.check(&user("manager"), &root, &ADMINISTER).unwrap(),
        Decision::Denied
    );
    assert!(!Decision::Denied.is_granted());
}

#[test]
fn test_pinned_strategy_ignores_later_publish() {
    let graph = graph(CatalogFlags::with_manage());
    let table = Arc::new(GrantTable::new(fixture_snapshot(&graph)));
    let strategy = GrantTableStrategy::new(Arc::clone(&graph), Arc::clone(&table));
    let root = ResourceNode::root();
    let manager = user("manager");

    let pinned = strategy.pin();
    table.publish(GrantSnapshot::empty());

    assert!(pinned.has_permission(&manager, &root, &MANAGE).unwrap());
    assert!(!strategy.has_permission(&manager, &root, &MANAGE).unwrap());
    assert!(!strategy
        .pin()
        .has_permission(&manager, &root, &MANAGE)
        .unwrap());
}

#[test]
fn test_unsecured_grants_everything_known() {
    let graph = graph(CatalogFlags::with_manage());
    let strategy = Unsecured::new(Arc::clone(&graph));
    let root = ResourceNode::root();

    assert!(strategy
        .has_permission(&Principal::anonymous(), &root, &ADMINISTER)
        .unwrap());
    assert!(strategy
        .pin()
        .has_permission(&user("x"), &root, &RUN_SCRIPTS)
        .unwrap());
    assert!(strategy
        .has_permission(&user("x"), &root, &PermissionId::new("Nope", "Nope"))
        .is_err());
}

#[test]
fn test_full_control_once_logged_in() {
    let graph = graph(CatalogFlags::with_manage());
    let root = ResourceNode::root();
    let anonymous = Principal::anonymous();

    let strict = FullControlOnceLoggedIn::new(Arc::clone(&graph), false);
    assert!(strict.has_permission(&user("x"), &root, &ADMINISTER).unwrap());
    assert!(!strict.has_permission(&anonymous, &root, &READ).unwrap());

    let lenient = FullControlOnceLoggedIn::new(Arc::clone(&graph), true);
    assert!(lenient.has_permission(&anonymous, &root, &READ).unwrap());
    assert!(!lenient.has_permission(&anonymous, &root, &MANAGE).unwrap());
    assert!(!lenient.has_permission(&anonymous, &root, &ADMINISTER).unwrap());
}
