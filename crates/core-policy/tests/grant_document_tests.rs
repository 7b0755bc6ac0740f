//! Integration tests for TOML grant documents

use core_identity::{Principal, Sid};
use core_policy::catalog::{standard_graph, CatalogFlags, ADMINISTER, ITEM_BUILD, MANAGE, READ};
use core_policy::{
    GrantDeclaration, GrantDocument, PolicyError, ResourceId, ResourceKind, ResourceNode, Scope,
    SnapshotAuthorizer, MAX_DOCUMENT_NAME_LENGTH, MAX_GRANTS_PER_SNAPSHOT,
};

const OPERATORS: &str = r#"
name = "operators"
version = 3

[metadata]
owner = "platform-team"

[[grants]]
sid = { user = "admin" }
permissions = ["Overall/Administer"]

[[grants]]
sid = { group = "operators" }
permissions = ["Overall/Manage", "Overall/Read"]

[[grants]]
sid = "everyone"
permissions = ["Item/Build"]
scope = { resource = "job/nightly" }
"#;

#[test]
fn test_document_parses() {
    let document = GrantDocument::from_toml(OPERATORS).unwrap();

    assert_eq!(document.name(), "operators");
    assert_eq!(document.version(), 3);
    assert_eq!(document.metadata().get("owner").unwrap(), "platform-team");
    assert_eq!(document.grants().len(), 3);
    assert_eq!(document.entry_count(), 4);

    let scoped = &document.grants()[2];
    assert_eq!(scoped.sid, Sid::Everyone);
    assert_eq!(scoped.scope, Scope::On(ResourceId::new("job/nightly")));
    assert_eq!(scoped.permissions, vec![ITEM_BUILD]);
}

#[test]
fn test_document_defaults() {
    let document = GrantDocument::from_toml(r#"name = "empty""#).unwrap();
    assert_eq!(document.version(), 1);
    assert!(document.grants().is_empty());
    assert!(document.metadata().is_empty());
}

#[test]
fn test_document_drives_decisions() {
    let graph = standard_graph(CatalogFlags::with_manage()).unwrap();
    let snapshot = GrantDocument::from_toml(OPERATORS)
        .unwrap()
        .to_snapshot(&graph)
        .unwrap();
    let auth = SnapshotAuthorizer::new(&graph, &snapshot);
    let root = ResourceNode::root();

    let operator = Principal::new("olivia")
        .unwrap()
        .with_group("operators")
        .unwrap();
    assert!(auth.has_permission(&operator, &root, &MANAGE).unwrap());
    assert!(!auth.has_permission(&operator, &root, &ADMINISTER).unwrap());

    let nightly = ResourceNode::new(ResourceKind::Item, "job/nightly");
    assert!(auth
        .has_permission(&Principal::anonymous(), &nightly, &ITEM_BUILD)
        .unwrap());
}

#[test]
fn test_unknown_permission_caught_at_snapshot() {
    let graph = standard_graph(CatalogFlags::with_manage()).unwrap();
    let document = GrantDocument::from_toml(
        r#"
name = "typo"

[[grants]]
sid = { user = "bob" }
permissions = ["Overall/Mange"]
"#,
    )
    .unwrap();

    assert!(matches!(
        document.to_snapshot(&graph),
        Err(PolicyError::UnknownPermission(_))
    ));
}

#[test]
fn test_malformed_permission_id_rejected() {
    let result = GrantDocument::from_toml(
        r#"
name = "bad"

[[grants]]
sid = { user = "bob" }
permissions = ["Manage"]
"#,
    );
    assert!(matches!(result, Err(PolicyError::TomlError(_))));
}

#[test]
fn test_empty_permission_list_rejected() {
    let result = GrantDocument::from_toml(
        r#"
name = "bad"

[[grants]]
sid = { group = "devs" }
permissions = []
"#,
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("lists no permissions"), "{err}");
}

#[test]
fn test_name_limits() {
    assert!(matches!(
        GrantDocument::new(""),
        Err(PolicyError::InvalidGrant(_))
    ));
    assert!(GrantDocument::new("a".repeat(MAX_DOCUMENT_NAME_LENGTH)).is_ok());
    assert!(matches!(
        GrantDocument::new("a".repeat(MAX_DOCUMENT_NAME_LENGTH + 1)),
        Err(PolicyError::NameTooLong { .. })
    ));
}

#[test]
fn test_grant_limit() {
    let declaration = GrantDeclaration {
        sid: Sid::user("bulk"),
        permissions: vec![READ; MAX_GRANTS_PER_SNAPSHOT],
        scope: Scope::Everywhere,
    };
    let document = GrantDocument::new("bulk")
        .unwrap()
        .add_grant(declaration)
        .unwrap();
    assert_eq!(document.entry_count(), MAX_GRANTS_PER_SNAPSHOT);

    let one_more = GrantDeclaration {
        sid: Sid::user("bulk"),
        permissions: vec![READ],
        scope: Scope::Everywhere,
    };
    assert!(matches!(
        document.add_grant(one_more),
        Err(PolicyError::TooManyGrants { .. })
    ));
}

#[test]
fn test_document_toml_round_trip() {
    let document = GrantDocument::new("roundtrip")
        .unwrap()
        .with_metadata("ticket", "OPS-12")
        .add_grant(GrantDeclaration {
            sid: Sid::group("operators"),
            permissions: vec![MANAGE, READ],
            scope: Scope::Everywhere,
        })
        .unwrap()
        .add_grant(GrantDeclaration {
            sid: Sid::user("dev"),
            permissions: vec![ITEM_BUILD],
            scope: Scope::On(ResourceId::new("job/nightly")),
        })
        .unwrap();

    let rendered = document.to_toml().unwrap();
    let parsed = GrantDocument::from_toml(&rendered).unwrap();

    assert_eq!(parsed.name(), document.name());
    assert_eq!(parsed.metadata(), document.metadata());
    assert_eq!(parsed.grants(), document.grants());
}
