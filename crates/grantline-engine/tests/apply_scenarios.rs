use std::time::Duration;

use grantline_core::{AccessLevel, AuthorizationAttrs, ChangeSet, ProjectId, UserId};
use grantline_engine::{EngineConfig, RecordingPublisher, apply_changes};
use grantline_storage::{AuthorizationStore, InMemoryStore};

fn attrs(user: i64, project: i64, level: AccessLevel) -> AuthorizationAttrs {
    AuthorizationAttrs::new(user, project, level)
}

async fn level_of(store: &InMemoryStore, user: i64, project: i64) -> Option<AccessLevel> {
    store
        .access_level(UserId::new(user), ProjectId::new(project))
        .await
        .unwrap()
}

// Scenario A: single addition produces one row and one event.
#[tokio::test]
async fn single_addition_yields_one_row_and_one_event() {
    let store = InMemoryStore::new();
    let publisher = RecordingPublisher::new();

    let changes = ChangeSet::build(|c| {
        c.add([attrs(1, 10, AccessLevel::Developer)]);
    });
    apply_changes(&store, &publisher, &EngineConfig::default(), changes)
        .await
        .unwrap();

    assert_eq!(store.row_count(), 1);
    assert_eq!(level_of(&store, 1, 10).await, Some(AccessLevel::Developer));

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].project_id, ProjectId::new(10));
}

// Scenario B: removal scope fires one event for the project even when most of
// the listed users had no row.
#[tokio::test]
async fn project_scoped_removal_fires_one_event_regardless_of_hits() {
    let store = InMemoryStore::new();
    let publisher = RecordingPublisher::new();
    let seed = ChangeSet::build(|c| {
        c.add([attrs(1, 10, AccessLevel::Guest)]);
    });
    apply_changes(&store, &RecordingPublisher::new(), &EngineConfig::default(), seed)
        .await
        .unwrap();

    let changes = ChangeSet::build(|c| {
        c.remove_users_in_project(10.into(), vec![1.into(), 2.into(), 3.into()]);
    });
    let summary = apply_changes(&store, &publisher, &EngineConfig::default(), changes)
        .await
        .unwrap();

    assert_eq!(summary.rows_deleted, 1);
    assert_eq!(store.row_count(), 0);

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].project_id, ProjectId::new(10));
}

// Scenario C: combined removal and addition touches three projects.
#[tokio::test]
async fn combined_removal_and_addition_publishes_per_project() {
    let store = InMemoryStore::new();
    let publisher = RecordingPublisher::new();
    let seed = ChangeSet::build(|c| {
        c.add([
            attrs(5, 20, AccessLevel::Reporter),
            attrs(5, 21, AccessLevel::Reporter),
        ]);
    });
    apply_changes(&store, &RecordingPublisher::new(), &EngineConfig::default(), seed)
        .await
        .unwrap();

    let changes = ChangeSet::build(|c| {
        c.remove_projects_for_user(5.into(), vec![20.into(), 21.into()]);
        c.add([attrs(5, 22, AccessLevel::Guest)]);
    });
    apply_changes(&store, &publisher, &EngineConfig::default(), changes)
        .await
        .unwrap();

    assert_eq!(level_of(&store, 5, 20).await, None);
    assert_eq!(level_of(&store, 5, 21).await, None);
    assert_eq!(level_of(&store, 5, 22).await, Some(AccessLevel::Guest));

    let mut event_projects: Vec<i64> = publisher
        .events()
        .iter()
        .map(|e| e.project_id.value())
        .collect();
    event_projects.sort_unstable();
    assert_eq!(event_projects, vec![20, 21, 22]);
}

// Scenario D: 2500 additions, batch size 1000, replica configured. Three
// batches, a delay between 1→2 and 2→3 but none after the final batch. Under
// the paused clock, elapsed time is exactly the slept time.
#[tokio::test(start_paused = true)]
async fn throttled_bulk_insert_sleeps_between_batches_only() {
    let store = InMemoryStore::with_replica();
    let publisher = RecordingPublisher::new();
    let config = EngineConfig::default();

    let changes = ChangeSet::build(|c| {
        c.add((1..=2500).map(|u| attrs(u, u % 7, AccessLevel::Guest)));
    });

    let started = tokio::time::Instant::now();
    let summary = apply_changes(&store, &publisher, &config, changes)
        .await
        .unwrap();

    assert_eq!(summary.insert_batches, 3);
    assert_eq!(summary.throttled_phases, 1);
    assert_eq!(store.upsert_batches(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn no_replica_means_no_delay() {
    let store = InMemoryStore::new();
    let publisher = RecordingPublisher::new();

    let changes = ChangeSet::build(|c| {
        c.add((1..=2500).map(|u| attrs(u, 1, AccessLevel::Guest)));
    });

    let started = tokio::time::Instant::now();
    let summary = apply_changes(&store, &publisher, &EngineConfig::default(), changes)
        .await
        .unwrap();

    assert_eq!(summary.insert_batches, 3);
    assert_eq!(summary.throttled_phases, 0);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

// P1: repeated applies never produce a second row for the same pair.
#[tokio::test]
async fn at_most_one_row_per_user_project_pair() {
    let store = InMemoryStore::new();

    for level in [
        AccessLevel::Guest,
        AccessLevel::Developer,
        AccessLevel::Owner,
    ] {
        let changes = ChangeSet::build(|c| {
            c.add([attrs(1, 10, level)]);
        });
        apply_changes(&store, &RecordingPublisher::new(), &EngineConfig::default(), changes)
            .await
            .unwrap();
    }

    assert_eq!(store.row_count(), 1);
}

// P2: last-applied tuple wins.
#[tokio::test]
async fn reapplying_a_tuple_is_idempotent_with_last_level_winning() {
    let store = InMemoryStore::new();

    let first = ChangeSet::build(|c| {
        c.add([attrs(1, 10, AccessLevel::Guest)]);
    });
    apply_changes(&store, &RecordingPublisher::new(), &EngineConfig::default(), first)
        .await
        .unwrap();

    let second = ChangeSet::build(|c| {
        c.add([attrs(1, 10, AccessLevel::Maintainer)]);
    });
    apply_changes(&store, &RecordingPublisher::new(), &EngineConfig::default(), second)
        .await
        .unwrap();

    assert_eq!(store.row_count(), 1);
    assert_eq!(level_of(&store, 1, 10).await, Some(AccessLevel::Maintainer));
}

// P3: a pair removed and re-added in the same change set ends up present with
// the new level, because deletes run before inserts.
#[tokio::test]
async fn remove_and_readd_in_one_change_set_keeps_new_level() {
    let store = InMemoryStore::new();
    let seed = ChangeSet::build(|c| {
        c.add([attrs(1, 10, AccessLevel::Guest)]);
    });
    apply_changes(&store, &RecordingPublisher::new(), &EngineConfig::default(), seed)
        .await
        .unwrap();

    let changes = ChangeSet::build(|c| {
        c.remove_users_in_project(10.into(), vec![1.into()]);
        c.add([attrs(1, 10, AccessLevel::Developer)]);
    });
    apply_changes(&store, &RecordingPublisher::new(), &EngineConfig::default(), changes)
        .await
        .unwrap();

    assert_eq!(store.row_count(), 1);
    assert_eq!(level_of(&store, 1, 10).await, Some(AccessLevel::Developer));
}

// P4: final row set does not depend on how the workload slices into batches.
#[tokio::test]
async fn batching_is_transparent_to_the_final_row_set() {
    let one_batch = InMemoryStore::new();
    let many_batches = InMemoryStore::new();
    let small = EngineConfig {
        batch_size: 3,
        ..EngineConfig::default()
    };

    for (store, config) in [
        (&one_batch, &EngineConfig::default()),
        (&many_batches, &small),
    ] {
        let changes = ChangeSet::build(|c| {
            c.add((1..=20).map(|u| attrs(u, u % 4, AccessLevel::Reporter)));
        });
        apply_changes(store, &RecordingPublisher::new(), config, changes)
            .await
            .unwrap();
    }

    assert_eq!(one_batch.row_count(), many_batches.row_count());
    for u in 1..=20 {
        assert_eq!(
            level_of(&one_batch, u, u % 4).await,
            level_of(&many_batches, u, u % 4).await,
        );
    }
    assert!(many_batches.upsert_batches() > one_batch.upsert_batches());
}

// P5: exactly one event per distinct touched project, duplicates collapsed.
#[tokio::test]
async fn events_deduplicated_across_additions_and_removals() {
    let store = InMemoryStore::new();
    let publisher = RecordingPublisher::new();

    let changes = ChangeSet::build(|c| {
        c.add([
            attrs(1, 10, AccessLevel::Guest),
            attrs(2, 10, AccessLevel::Guest),
            attrs(3, 11, AccessLevel::Guest),
        ]);
        c.remove_projects_for_user(9.into(), vec![10.into(), 12.into()]);
    });
    let summary = apply_changes(&store, &publisher, &EngineConfig::default(), changes)
        .await
        .unwrap();

    let mut event_projects: Vec<i64> = publisher
        .events()
        .iter()
        .map(|e| e.project_id.value())
        .collect();
    event_projects.sort_unstable();
    assert_eq!(event_projects, vec![10, 11, 12]);
    assert_eq!(summary.events_published, 3);
}

// Duplicate addition tuples for one pair collapse to the last one given.
#[tokio::test]
async fn duplicate_additions_resolve_to_last_tuple() {
    let store = InMemoryStore::new();
    let publisher = RecordingPublisher::new();

    let changes = ChangeSet::build(|c| {
        c.add([attrs(1, 10, AccessLevel::Guest)]);
        c.add([attrs(1, 10, AccessLevel::Owner)]);
    });
    let summary = apply_changes(&store, &publisher, &EngineConfig::default(), changes)
        .await
        .unwrap();

    assert_eq!(store.row_count(), 1);
    assert_eq!(level_of(&store, 1, 10).await, Some(AccessLevel::Owner));
    assert_eq!(summary.rows_inserted, 1);
    assert_eq!(publisher.events().len(), 1);
}

// Retry-from-scratch after a partial failure converges to the same state.
#[tokio::test]
async fn reapplying_the_same_work_order_is_safe() {
    let store = InMemoryStore::new();

    for _ in 0..2 {
        let changes = ChangeSet::build(|c| {
            c.add([
                attrs(1, 10, AccessLevel::Developer),
                attrs(2, 11, AccessLevel::Guest),
            ]);
            c.remove_projects_for_user(3.into(), vec![10.into()]);
        });
        apply_changes(&store, &RecordingPublisher::new(), &EngineConfig::default(), changes)
            .await
            .unwrap();
    }

    assert_eq!(store.row_count(), 2);
    assert_eq!(level_of(&store, 1, 10).await, Some(AccessLevel::Developer));
    assert_eq!(level_of(&store, 2, 11).await, Some(AccessLevel::Guest));
}
