//! Property-based tests for filtered submissions
//!
//! Over arbitrary submissions to the global configuration:
//! - the saved bytes equal those of submitting the editable subset alone
//! - fields outside the editable set never change

use core_identity::Principal;
use core_policy::catalog::{
    global_configuration_policy, standard_field_index, standard_graph, CatalogFlags, ADMINISTER,
    GLOBAL_CONFIGURATION, MANAGE, READ,
};
use core_policy::{GrantSetBuilder, GrantTable, GrantTableStrategy, ResourceNode};
use proptest::prelude::*;
use std::sync::Arc;
use warden_gateway::{AccessGateway, ConfigEntity};

fn gateway() -> AccessGateway {
    let graph = Arc::new(standard_graph(CatalogFlags::with_manage()).unwrap());
    let fields = Arc::new(standard_field_index(&graph).unwrap());
    let snapshot = GrantSetBuilder::new()
        .grant([ADMINISTER])
        .to_user("admin")
        .grant([MANAGE, READ])
        .to_user("manager")
        .build(&graph)
        .unwrap();
    let strategy = GrantTableStrategy::new(graph, Arc::new(GrantTable::new(snapshot)));
    AccessGateway::new(Arc::new(strategy), fields)
}

/// Declared field names plus a few the form does not know
fn candidate_fields() -> Vec<String> {
    global_configuration_policy()
        .fields()
        .iter()
        .map(|record| record.field().as_str().to_string())
        .chain(["forged", "injected"].map(String::from))
        .collect()
}

fn arb_submission() -> impl Strategy<Value = ConfigEntity> {
    let names = candidate_fields();
    proptest::collection::vec((0..names.len(), any::<i64>()), 0..12).prop_map(move |pairs| {
        pairs
            .into_iter()
            .map(|(i, value)| (names[i].clone(), value))
            .fold(ConfigEntity::new(), |entity, (name, value)| {
                entity.with(name, value)
            })
    })
}

fn stored() -> ConfigEntity {
    candidate_fields()
        .into_iter()
        .take_while(|name| name != "forged")
        .fold(ConfigEntity::new(), |entity, name| entity.with(name, 0_i64))
}

proptest! {
    #[test]
    fn prop_forged_fields_are_invisible_to_persistence(
        submission in arb_submission(),
        as_admin in any::<bool>(),
    ) {
        let gateway = gateway();
        let principal = Principal::new(if as_admin { "admin" } else { "manager" }).unwrap();
        let root = ResourceNode::root();

        let editable = gateway
            .fields()
            .fields_editable_to(&**gateway.strategy(), &principal, &root, &GLOBAL_CONFIGURATION)
            .unwrap();
        let subset: ConfigEntity = submission
            .iter()
            .filter(|(field, _)| editable.contains(*field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();

        let mut forged = stored();
        gateway
            .apply_submission(&principal, &root, &GLOBAL_CONFIGURATION, &mut forged, &submission)
            .unwrap();
        let mut honest = stored();
        gateway
            .apply_submission(&principal, &root, &GLOBAL_CONFIGURATION, &mut honest, &subset)
            .unwrap();

        prop_assert_eq!(forged.to_toml().unwrap(), honest.to_toml().unwrap());
    }

    #[test]
    fn prop_non_editable_fields_never_change(submission in arb_submission()) {
        let gateway = gateway();
        let manager = Principal::new("manager").unwrap();
        let root = ResourceNode::root();

        let editable = gateway
            .fields()
            .fields_editable_to(&**gateway.strategy(), &manager, &root, &GLOBAL_CONFIGURATION)
            .unwrap();

        let before = stored();
        let mut after = before.clone();
        let report = gateway
            .apply_submission(&manager, &root, &GLOBAL_CONFIGURATION, &mut after, &submission)
            .unwrap();

        prop_assert!(report.applied.is_subset(&editable));
        for (field, value) in before.iter() {
            if !editable.contains(field) {
                prop_assert_eq!(after.get(field.as_str()), Some(value));
            }
        }
        prop_assert!(after.get("forged").is_none());
        prop_assert!(after.get("injected").is_none());
    }
}
