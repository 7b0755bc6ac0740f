//! Integration tests for GrantSetBuilder

use core_identity::Sid;
use core_policy::catalog::{standard_graph, CatalogFlags, ADMINISTER, ITEM_BUILD, MANAGE, READ};
use core_policy::{GrantEntry, GrantSetBuilder, PermissionId, PolicyError, ResourceId, Scope};

#[test]
fn test_builder_expands_one_entry_per_permission() {
    let builder = GrantSetBuilder::new()
        .grant([MANAGE, READ])
        .everywhere()
        .to_group("operators");

    assert_eq!(
        builder.entries(),
        &[
            GrantEntry::new(Sid::group("operators"), MANAGE, Scope::Everywhere),
            GrantEntry::new(Sid::group("operators"), READ, Scope::Everywhere),
        ]
    );
}

#[test]
fn test_builder_scope_defaults_to_everywhere() {
    let builder = GrantSetBuilder::new().grant([READ]).to_everyone();
    assert_eq!(builder.entries()[0].scope, Scope::Everywhere);
    assert_eq!(builder.entries()[0].sid, Sid::Everyone);
}

#[test]
fn test_builder_resource_scope() {
    let builder = GrantSetBuilder::new()
        .grant([ITEM_BUILD])
        .on("job/nightly")
        .to_user("dev");

    assert_eq!(
        builder.entries()[0].scope,
        Scope::On(ResourceId::new("job/nightly"))
    );
}

#[test]
fn test_builder_mixed_entries() {
    let graph = standard_graph(CatalogFlags::with_manage()).unwrap();
    let snapshot = GrantSetBuilder::new()
        .grant([ADMINISTER])
        .to_user("admin")
        .add_entry(GrantEntry::new(
            Sid::user("manager"),
            MANAGE,
            Scope::Everywhere,
        ))
        .grant([READ])
        .to(Sid::Everyone)
        .build(&graph)
        .unwrap();

    assert_eq!(snapshot.len(), 3);
    assert!(snapshot
        .granted(&Sid::user("manager"), &Scope::Everywhere)
        .unwrap()
        .contains(&MANAGE));
    assert!(snapshot
        .granted(&Sid::user("manager"), &Scope::On(ResourceId::root()))
        .is_none());
}

#[test]
fn test_builder_rejects_unknown_permission() {
    let graph = standard_graph(CatalogFlags::with_manage()).unwrap();
    let result = GrantSetBuilder::new()
        .grant([PermissionId::new("Overall", "Everything")])
        .to_user("mallory")
        .build(&graph);

    assert!(matches!(result, Err(PolicyError::UnknownPermission(_))));
}

#[test]
fn test_empty_builder_is_deny_all() {
    let graph = standard_graph(CatalogFlags::with_manage()).unwrap();
    let snapshot = GrantSetBuilder::new().build(&graph).unwrap();
    assert!(snapshot.is_empty());
}
