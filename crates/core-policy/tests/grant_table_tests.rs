//! Integration tests for the versioned grant table

use core_identity::{Principal, Sid};
use core_policy::catalog::{standard_graph, CatalogFlags, ADMINISTER, MANAGE, READ};
use core_policy::{
    AuthorizationStrategy, GrantEntry, GrantSetBuilder, GrantSnapshot, GrantTable,
    GrantTableStrategy, PermissionGraph, PermissionId, PolicyError, ResourceNode, Scope,
};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

fn graph() -> Arc<PermissionGraph> {
    Arc::new(standard_graph(CatalogFlags::with_manage()).unwrap())
}

#[test]
fn test_new_table_is_version_one() {
    let table = GrantTable::default();
    assert_eq!(table.version(), 1);
    assert_eq!(table.snapshot().version(), 1);
    assert!(table.snapshot().is_empty());
}

#[test]
fn test_publish_bumps_version() {
    let graph = graph();
    let table = GrantTable::default();
    let before = table.snapshot();

    let next = GrantSetBuilder::new()
        .grant([READ])
        .to_everyone()
        .build(&graph)
        .unwrap();
    assert_eq!(table.publish(next), 2);
    assert_eq!(table.version(), 2);

    // Earlier snapshots stay valid and unchanged
    assert_eq!(before.version(), 1);
    assert!(before.is_empty());
    assert_eq!(table.snapshot().len(), 1);
}

#[test]
fn test_update_edits_current_entries() {
    let graph = graph();
    let table = GrantTable::new(
        GrantSetBuilder::new()
            .grant([MANAGE])
            .to_user("manager")
            .build(&graph)
            .unwrap(),
    );

    let version = table
        .update(&graph, |entries| {
            entries.retain(|e| e.sid != Sid::user("manager"));
            entries.push(GrantEntry::new(
                Sid::user("admin"),
                ADMINISTER,
                Scope::Everywhere,
            ));
        })
        .unwrap();

    assert_eq!(version, 2);
    let snapshot = table.snapshot();
    assert_eq!(snapshot.entries().len(), 1);
    assert_eq!(snapshot.entries()[0].sid, Sid::user("admin"));
}

#[test]
fn test_failed_update_keeps_current_snapshot() {
    let graph = graph();
    let table = GrantTable::default();

    let result = table.update(&graph, |entries| {
        entries.push(GrantEntry::new(
            Sid::user("x"),
            PermissionId::new("Overall", "Unknown"),
            Scope::Everywhere,
        ));
    });

    assert!(matches!(result, Err(PolicyError::UnknownPermission(_))));
    assert_eq!(table.version(), 1);
    assert!(table.snapshot().is_empty());
}

#[test]
fn test_policy_change_visible_to_next_check() {
    let graph = graph();
    let table = Arc::new(GrantTable::default());
    let strategy = GrantTableStrategy::new(Arc::clone(&graph), Arc::clone(&table));
    let manager = Principal::new("manager").unwrap();
    let root = ResourceNode::root();

    assert!(!strategy.has_permission(&manager, &root, &MANAGE).unwrap());
    strategy
        .table()
        .update(strategy.graph(), |entries| {
            entries.push(GrantEntry::new(
                Sid::user("manager"),
                MANAGE,
                Scope::Everywhere,
            ));
        })
        .unwrap();
    assert!(strategy.has_permission(&manager, &root, &MANAGE).unwrap());
}

#[test]
fn test_concurrent_readers_never_see_mixed_state() {
    let graph = graph();

    // Published snapshots alternate between both permissions and neither
    let both = GrantSetBuilder::new()
        .grant([MANAGE, READ])
        .to_user("manager")
        .build(&graph)
        .unwrap();
    let table = Arc::new(GrantTable::new(both.clone()));
    let strategy = GrantTableStrategy::new(Arc::clone(&graph), Arc::clone(&table));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let strategy = strategy.clone();
            thread::spawn(move || {
                let manager = Principal::new("manager").unwrap();
                let root = ResourceNode::root();
                for _ in 0..500 {
                    let pinned = strategy.pin();
                    let manage = pinned.has_permission(&manager, &root, &MANAGE).unwrap();
                    let read = pinned.has_permission(&manager, &root, &READ).unwrap();
                    assert_eq!(manage, read, "pinned view mixed two snapshots");
                }
            })
        })
        .collect();

    for i in 0..200 {
        if i % 2 == 0 {
            table.publish(GrantSnapshot::empty());
        } else {
            table.publish(both.clone());
        }
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(table.version(), 201);
}

#[test]
fn test_readers_not_blocked_by_slow_update() {
    let graph = graph();
    let table = Arc::new(GrantTable::default());
    let (started, editing) = mpsc::channel();

    let writer = {
        let table = Arc::clone(&table);
        let graph = Arc::clone(&graph);
        thread::spawn(move || {
            table
                .update(&graph, |entries| {
                    started.send(()).unwrap();
                    thread::sleep(Duration::from_millis(400));
                    entries.push(GrantEntry::new(Sid::Everyone, READ, Scope::Everywhere));
                })
                .unwrap()
        })
    };

    editing.recv().unwrap();
    let start = Instant::now();
    let snapshot = table.snapshot();
    let waited = start.elapsed();

    assert!(
        waited < Duration::from_millis(100),
        "snapshot() waited {waited:?} during update()"
    );
    // Still the old state until the swap
    assert_eq!(snapshot.version(), 1);
    assert!(snapshot.is_empty());

    assert_eq!(writer.join().unwrap(), 2);
    assert_eq!(table.snapshot().len(), 1);
}

#[test]
fn test_update_closure_may_read_table() {
    let graph = graph();
    let table = GrantTable::default();

    let version = table
        .update(&graph, |entries| {
            let current = table.snapshot();
            assert_eq!(current.version(), 1);
            entries.push(GrantEntry::new(Sid::user("admin"), ADMINISTER, Scope::Everywhere));
        })
        .unwrap();

    assert_eq!(version, 2);
}

#[test]
fn test_concurrent_updates_are_never_lost() {
    let graph = graph();
    let table = Arc::new(GrantTable::default());

    let updaters: Vec<_> = (0..4)
        .map(|i| {
            let table = Arc::clone(&table);
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                for j in 0..25 {
                    table
                        .update(&graph, |entries| {
                            entries.push(GrantEntry::new(
                                Sid::user(format!("user-{i}-{j}")),
                                READ,
                                Scope::Everywhere,
                            ));
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for updater in updaters {
        updater.join().unwrap();
    }
    assert_eq!(table.version(), 101);
    assert_eq!(table.snapshot().len(), 100);
}
