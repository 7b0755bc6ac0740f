use core_policy::{resolve_owner, PolicyError, Resource, ResourceId, ResourceKind};
use warden_gateway::parse_resource;

#[test]
fn test_parse_resource() {
    assert_eq!(parse_resource("/").unwrap().kind(), ResourceKind::Root);
    assert_eq!(parse_resource("job/app").unwrap().kind(), ResourceKind::Item);
    assert_eq!(
        parse_resource("job/folder/app").unwrap().kind(),
        ResourceKind::Item
    );
    assert_eq!(parse_resource("view/all").unwrap().kind(), ResourceKind::View);
    assert_eq!(
        parse_resource("computer/agent-1").unwrap().kind(),
        ResourceKind::Computer
    );
    assert_eq!(
        parse_resource("plugin/git").unwrap().kind(),
        ResourceKind::Plugin
    );
}

#[test]
fn test_plugins_and_built_in_node_delegate_to_root() {
    for path in ["plugin/git", "computer/(built-in)", "computer/(master)"] {
        let resource = parse_resource(path).unwrap();
        assert_eq!(resource.resource_id().as_str(), path);
        let owner = resolve_owner(&resource).unwrap();
        assert_eq!(owner.resource_id(), &ResourceId::root(), "{path}");
    }
}

#[test]
fn test_other_resources_own_their_checks() {
    for path in ["job/app", "computer/agent-1", "view/all"] {
        let resource = parse_resource(path).unwrap();
        let owner = resolve_owner(&resource).unwrap();
        assert_eq!(owner.resource_id().as_str(), path);
    }
}

#[test]
fn test_malformed_paths_rejected() {
    for path in ["", "job", "job/", "/job/app", "job//app", "node/x", "plugin/git/"] {
        assert!(
            matches!(
                parse_resource(path),
                Err(PolicyError::InvalidResourcePath(_))
            ),
            "{path:?} should be rejected"
        );
    }
}
