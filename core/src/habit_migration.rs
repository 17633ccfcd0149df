//! One-shot migration of legacy `habitTracks` records into `habits` plus
//! linked `habitCompletions`.
//!
//! The run is guarded: it only writes when legacy records exist and no habit
//! has been created yet, so a second run is a no-op. Individual writes are
//! best-effort. A failed write is recorded in the report and the rest of the
//! batch carries on. Deleting the legacy records is a separate operation,
//! [`cleanup_legacy_records`], that never runs as part of the migration.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result, bail};
use futures::future::join_all;
use log::{error, info, warn};

use crate::models::{LegacyHabitRecord, NewHabit, NewHabitCompletion, now_timestamp};
use crate::schema::{HABIT_COMPLETIONS_HABIT, Namespace};
use crate::store::{Entity, EntityId, Store, StoreError, TxOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoLegacyRecords,
    HabitsExist { count: usize },
}

#[derive(Debug)]
pub enum MigrationOutcome {
    Skipped(SkipReason),
    Completed(MigrationReport),
}

impl MigrationOutcome {
    #[must_use]
    pub fn report(&self) -> Option<&MigrationReport> {
        match self {
            MigrationOutcome::Completed(report) => Some(report),
            MigrationOutcome::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub legacy_records: usize,
    pub habits_created: usize,
    pub completions_created: usize,
    pub issues: Vec<MigrationIssue>,
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationIssue {
    #[error("legacy record {record_id} could not be read: {source}")]
    MalformedLegacyRecord {
        record_id: EntityId,
        source: StoreError,
    },
    #[error("no habit id for '{habit_name}' (legacy record {record_id})")]
    UnresolvedHabitReference {
        record_id: EntityId,
        habit_name: String,
    },
    #[error("failed to create habit '{habit_name}': {source}")]
    HabitWriteFailed {
        habit_name: String,
        source: StoreError,
    },
    #[error("failed to create completion for legacy record {record_id} ('{habit_name}'): {source}")]
    CompletionWriteFailed {
        record_id: EntityId,
        habit_name: String,
        source: StoreError,
    },
    #[error("failed to delete legacy record {record_id}: {source}")]
    LegacyDeleteFailed {
        record_id: EntityId,
        source: StoreError,
    },
}

/// Convert every legacy habit track into the habit/completion model.
///
/// Only a failure of the initial read is returned as an error.
pub async fn migrate_habit_data<S: Store + ?Sized>(store: &S) -> Result<MigrationOutcome> {
    let snapshot = store
        .query(&[Namespace::HabitTracks, Namespace::Habits])
        .await
        .context("Failed to read legacy habit data")?;

    let legacy_entities = snapshot.entities(Namespace::HabitTracks);
    let existing_habits = snapshot.entities(Namespace::Habits).len();

    if legacy_entities.is_empty() {
        info!("No migration needed for habit data: no legacy habit tracks");
        return Ok(MigrationOutcome::Skipped(SkipReason::NoLegacyRecords));
    }
    if existing_habits > 0 {
        info!("No migration needed for habit data: {existing_habits} habit(s) already exist");
        return Ok(MigrationOutcome::Skipped(SkipReason::HabitsExist {
            count: existing_habits,
        }));
    }

    info!(
        "Migrating {} habit tracks to the new model...",
        legacy_entities.len()
    );

    let (records, mut issues) = decode_legacy(legacy_entities);
    let names = distinct_habit_names(&records);

    // Every habit write settles before any completion is issued.
    let (habit_ids, habit_issues) = create_habits(store, &names, &now_timestamp()).await;
    issues.extend(habit_issues);

    let (completions_created, completion_issues) =
        create_completions(store, &records, &habit_ids).await;
    issues.extend(completion_issues);

    let report = MigrationReport {
        legacy_records: legacy_entities.len(),
        habits_created: habit_ids.len(),
        completions_created,
        issues,
    };

    info!(
        "Migration completed: created {} habits and {} completions",
        report.habits_created, report.completions_created
    );
    if !report.issues.is_empty() {
        warn!(
            "{} legacy record(s) or habit(s) need manual attention",
            report.issues.len()
        );
    }

    Ok(MigrationOutcome::Completed(report))
}

fn decode_legacy(entities: &[Entity]) -> (Vec<LegacyHabitRecord>, Vec<MigrationIssue>) {
    let mut records = Vec::with_capacity(entities.len());
    let mut issues = Vec::new();
    for entity in entities {
        match entity.decode::<LegacyHabitRecord>() {
            Ok(record) => records.push(record),
            Err(source) => {
                error!("Skipping unreadable legacy record {}: {source}", entity.id);
                issues.push(MigrationIssue::MalformedLegacyRecord {
                    record_id: entity.id,
                    source,
                });
            }
        }
    }
    (records, issues)
}

/// Distinct names in first-seen order. Names are compared exactly, with no
/// case or whitespace folding.
fn distinct_habit_names(records: &[LegacyHabitRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.habit_name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Create one habit per name. The returned map only holds habits whose
/// write succeeded.
pub(crate) async fn create_habits<S: Store + ?Sized>(
    store: &S,
    names: &[&str],
    created_at: &str,
) -> (HashMap<String, EntityId>, Vec<MigrationIssue>) {
    let writes = names.iter().map(|&name| async move {
        let id = store.new_id();
        let habit = NewHabit {
            name: name.to_string(),
            description: None,
            created_at: created_at.to_string(),
        };
        let result = match TxOp::update(Namespace::Habits, id, &habit) {
            Ok(op) => store.transact(vec![op]).await,
            Err(e) => Err(e),
        };
        (name, id, result)
    });

    let mut habit_ids = HashMap::with_capacity(names.len());
    let mut issues = Vec::new();
    for (name, id, result) in join_all(writes).await {
        match result {
            Ok(()) => {
                habit_ids.insert(name.to_string(), id);
            }
            Err(source) => {
                error!("Failed to create habit '{name}': {source}");
                issues.push(MigrationIssue::HabitWriteFailed {
                    habit_name: name.to_string(),
                    source,
                });
            }
        }
    }
    (habit_ids, issues)
}

/// Create one linked completion per legacy record, resolving the habit
/// through `habit_ids`.
pub(crate) async fn create_completions<S: Store + ?Sized>(
    store: &S,
    records: &[LegacyHabitRecord],
    habit_ids: &HashMap<String, EntityId>,
) -> (usize, Vec<MigrationIssue>) {
    let mut issues = Vec::new();
    let mut writes = Vec::with_capacity(records.len());

    for record in records {
        let Some(&habit_id) = habit_ids.get(&record.habit_name) else {
            error!(
                "Could not find habit ID for name: {} (legacy record {})",
                record.habit_name, record.id
            );
            issues.push(MigrationIssue::UnresolvedHabitReference {
                record_id: record.id,
                habit_name: record.habit_name.clone(),
            });
            continue;
        };
        writes.push(async move { (record, write_completion(store, record, habit_id).await) });
    }

    let mut created = 0;
    for (record, result) in join_all(writes).await {
        match result {
            Ok(()) => created += 1,
            Err(source) => {
                error!(
                    "Failed to create completion for legacy record {} ('{}', {}): {source}",
                    record.id, record.habit_name, record.date
                );
                issues.push(MigrationIssue::CompletionWriteFailed {
                    record_id: record.id,
                    habit_name: record.habit_name.clone(),
                    source,
                });
            }
        }
    }
    (created, issues)
}

async fn write_completion<S: Store + ?Sized>(
    store: &S,
    record: &LegacyHabitRecord,
    habit_id: EntityId,
) -> Result<(), StoreError> {
    let id = store.new_id();
    let completion = NewHabitCompletion {
        date: record.date.clone(),
        completed: record.completed,
        notes: record.notes.clone().unwrap_or_default(),
        created_at: record.created_at.clone(),
    };
    store
        .transact(vec![
            TxOp::update(Namespace::HabitCompletions, id, &completion)?,
            TxOp::link(
                Namespace::HabitCompletions,
                id,
                HABIT_COMPLETIONS_HABIT.label,
                habit_id,
            ),
        ])
        .await
}

#[derive(Debug, Default)]
pub struct CleanupReport {
    pub legacy_records: usize,
    pub deleted: usize,
    pub issues: Vec<MigrationIssue>,
}

/// Delete the legacy habit tracks once the migration has been verified.
///
/// Refuses to run while no habits exist, since the legacy records would then
/// be the only copy of the data.
pub async fn cleanup_legacy_records<S: Store + ?Sized>(store: &S) -> Result<CleanupReport> {
    let snapshot = store
        .query(&[
            Namespace::HabitTracks,
            Namespace::Habits,
            Namespace::HabitCompletions,
        ])
        .await
        .context("Failed to read legacy habit data")?;

    let legacy = snapshot.entities(Namespace::HabitTracks);
    if legacy.is_empty() {
        info!("No legacy habit tracks to delete");
        return Ok(CleanupReport::default());
    }
    if snapshot.entities(Namespace::Habits).is_empty() {
        bail!(
            "Refusing to delete {} legacy habit tracks: no habits exist yet, run the migration first",
            legacy.len()
        );
    }
    let completions = snapshot.entities(Namespace::HabitCompletions).len();
    if completions < legacy.len() {
        warn!(
            "Only {completions} completions exist for {} legacy habit tracks",
            legacy.len()
        );
    }

    let deletes = legacy.iter().map(|entity| async move {
        let result = store
            .transact(vec![TxOp::delete(Namespace::HabitTracks, entity.id)])
            .await;
        (entity.id, result)
    });

    let mut report = CleanupReport {
        legacy_records: legacy.len(),
        ..CleanupReport::default()
    };
    for (record_id, result) in join_all(deletes).await {
        match result {
            Ok(()) => report.deleted += 1,
            Err(source) => {
                error!("Failed to delete legacy record {record_id}: {source}");
                report
                    .issues
                    .push(MigrationIssue::LegacyDeleteFailed { record_id, source });
            }
        }
    }

    info!("Deleted {} old habit tracks", report.deleted);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Habit, HabitCompletion, NewLegacyHabitRecord};
    use crate::store::{QueryResult, SqliteStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Wraps a real store, records every write batch, and fails writes on demand.
    struct FaultyStore {
        inner: SqliteStore,
        writes: Mutex<Vec<Namespace>>,
        fail_habit_names: Vec<&'static str>,
        fail_completion_dates: Vec<&'static str>,
        fail_reads: bool,
    }

    impl FaultyStore {
        fn new(inner: SqliteStore) -> Self {
            Self {
                inner,
                writes: Mutex::new(Vec::new()),
                fail_habit_names: Vec::new(),
                fail_completion_dates: Vec::new(),
                fail_reads: false,
            }
        }

        fn write_log(&self) -> Vec<Namespace> {
            self.writes.lock().unwrap().clone()
        }

        fn should_fail(&self, ops: &[TxOp]) -> bool {
            ops.iter().any(|op| match op {
                TxOp::Update {
                    namespace: Namespace::Habits,
                    attrs,
                    ..
                } => self
                    .fail_habit_names
                    .iter()
                    .any(|n| attrs.get("name") == Some(&json!(n))),
                TxOp::Update {
                    namespace: Namespace::HabitCompletions,
                    attrs,
                    ..
                } => self
                    .fail_completion_dates
                    .iter()
                    .any(|d| attrs.get("date") == Some(&json!(d))),
                _ => false,
            })
        }
    }

    #[async_trait]
    impl Store for FaultyStore {
        async fn query(&self, namespaces: &[Namespace]) -> Result<QueryResult, StoreError> {
            if self.fail_reads {
                return Err(StoreError::UnknownNamespace("offline".to_string()));
            }
            self.inner.query(namespaces).await
        }

        async fn transact(&self, ops: Vec<TxOp>) -> Result<(), StoreError> {
            if let Some(first) = ops.first() {
                self.writes.lock().unwrap().push(first.namespace());
            }
            if self.should_fail(&ops) {
                return Err(StoreError::Validation {
                    namespace: ops[0].namespace(),
                    attribute: "name".to_string(),
                    reason: "injected failure".to_string(),
                });
            }
            self.inner.transact(ops).await
        }
    }

    async fn seed_legacy(store: &SqliteStore, rows: &[(&str, &str, bool, &str)]) -> Vec<EntityId> {
        let mut ids = Vec::new();
        for (name, date, completed, created_at) in rows {
            let id = store.new_id();
            let record = NewLegacyHabitRecord {
                habit_name: (*name).to_string(),
                date: (*date).to_string(),
                completed: *completed,
                notes: None,
                created_at: (*created_at).to_string(),
            };
            store
                .transact(vec![TxOp::update(Namespace::HabitTracks, id, &record).unwrap()])
                .await
                .unwrap();
            ids.push(id);
        }
        ids
    }

    const SCENARIO: &[(&str, &str, bool, &str)] = &[
        ("Meditate", "2024-01-01", true, "t1"),
        ("Meditate", "2024-01-02", false, "t2"),
        ("Read", "2024-01-01", true, "t3"),
    ];

    async fn habits_and_completions(store: &SqliteStore) -> (Vec<Habit>, Vec<HabitCompletion>) {
        let result = store
            .query(&[Namespace::Habits, Namespace::HabitCompletions])
            .await
            .unwrap();
        let habits = result.decode_all(Namespace::Habits).unwrap();
        let completions = result
            .entities(Namespace::HabitCompletions)
            .iter()
            .map(|e| HabitCompletion::from_entity(e).unwrap())
            .collect();
        (habits, completions)
    }

    fn habit_name(habits: &[Habit], id: Option<EntityId>) -> &str {
        let id = id.expect("completion is linked");
        &habits.iter().find(|h| h.id == id).unwrap().name
    }

    #[tokio::test]
    async fn test_migrates_scenario() {
        let inner = SqliteStore::open_in_memory().unwrap();
        seed_legacy(&inner, SCENARIO).await;
        let store = FaultyStore::new(inner.clone());

        let outcome = migrate_habit_data(&store).await.unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.legacy_records, 3);
        assert_eq!(report.habits_created, 2);
        assert_eq!(report.completions_created, 3);
        assert!(report.issues.is_empty());

        let (habits, completions) = habits_and_completions(&inner).await;
        let mut names: Vec<&str> = habits.iter().map(|h| h.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Meditate", "Read"]);
        assert!(habits.iter().all(|h| !h.created_at.is_empty()));

        assert_eq!(completions.len(), 3);
        for (name, date, completed, created_at) in SCENARIO {
            let c = completions
                .iter()
                .find(|c| c.created_at.as_deref() == Some(*created_at))
                .unwrap();
            assert_eq!(c.date, *date);
            assert_eq!(c.completed, *completed);
            assert_eq!(c.notes, "");
            assert_eq!(habit_name(&habits, c.habit_id), *name);
        }
    }

    #[tokio::test]
    async fn test_skips_without_legacy_records() {
        let store = FaultyStore::new(SqliteStore::open_in_memory().unwrap());
        let outcome = migrate_habit_data(&store).await.unwrap();
        assert!(matches!(
            outcome,
            MigrationOutcome::Skipped(SkipReason::NoLegacyRecords)
        ));
        assert!(store.write_log().is_empty());
    }

    #[tokio::test]
    async fn test_skips_when_habits_exist() {
        let inner = SqliteStore::open_in_memory().unwrap();
        seed_legacy(&inner, SCENARIO).await;
        inner
            .transact(vec![
                TxOp::update(Namespace::Habits, inner.new_id(), &json!({ "name": "Walk" })).unwrap(),
            ])
            .await
            .unwrap();
        let store = FaultyStore::new(inner);

        let outcome = migrate_habit_data(&store).await.unwrap();
        assert!(matches!(
            outcome,
            MigrationOutcome::Skipped(SkipReason::HabitsExist { count: 1 })
        ));
        assert!(store.write_log().is_empty());
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let inner = SqliteStore::open_in_memory().unwrap();
        seed_legacy(&inner, SCENARIO).await;
        migrate_habit_data(&inner).await.unwrap();

        let store = FaultyStore::new(inner.clone());
        let outcome = migrate_habit_data(&store).await.unwrap();
        assert!(matches!(
            outcome,
            MigrationOutcome::Skipped(SkipReason::HabitsExist { count: 2 })
        ));
        assert!(store.write_log().is_empty());

        let (habits, completions) = habits_and_completions(&inner).await;
        assert_eq!(habits.len(), 2);
        assert_eq!(completions.len(), 3);
    }

    #[tokio::test]
    async fn test_names_compare_exactly() {
        let inner = SqliteStore::open_in_memory().unwrap();
        seed_legacy(
            &inner,
            &[
                ("Read", "2024-01-01", true, "t1"),
                ("read", "2024-01-02", true, "t2"),
                ("Read ", "2024-01-03", true, "t3"),
                ("Read", "2024-01-04", true, "t4"),
            ],
        )
        .await;

        let outcome = migrate_habit_data(&inner).await.unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.habits_created, 3);
        assert_eq!(report.completions_created, 4);
    }

    #[tokio::test]
    async fn test_habit_writes_settle_before_completions() {
        let inner = SqliteStore::open_in_memory().unwrap();
        seed_legacy(&inner, SCENARIO).await;
        let store = FaultyStore::new(inner);

        migrate_habit_data(&store).await.unwrap();

        let log = store.write_log();
        assert_eq!(log.len(), 5);
        let first_completion = log
            .iter()
            .position(|ns| *ns == Namespace::HabitCompletions)
            .unwrap();
        assert!(log[..first_completion].iter().all(|ns| *ns == Namespace::Habits));
        assert!(log[first_completion..]
            .iter()
            .all(|ns| *ns == Namespace::HabitCompletions));
    }

    #[tokio::test]
    async fn test_unresolved_name_is_skipped_and_reported() {
        let inner = SqliteStore::open_in_memory().unwrap();
        let ids = seed_legacy(&inner, SCENARIO).await;
        let records: Vec<LegacyHabitRecord> = inner
            .query(&[Namespace::HabitTracks])
            .await
            .unwrap()
            .decode_all(Namespace::HabitTracks)
            .unwrap();

        let (habit_ids, issues) = create_habits(&inner, &["Meditate", "Read"], "now").await;
        assert!(issues.is_empty());
        let mut corrupted = habit_ids.clone();
        corrupted.remove("Read");

        let (created, issues) = create_completions(&inner, &records, &corrupted).await;
        assert_eq!(created, 2);
        assert_eq!(issues.len(), 1);
        match &issues[0] {
            MigrationIssue::UnresolvedHabitReference {
                record_id,
                habit_name,
            } => {
                assert_eq!(*record_id, ids[2]);
                assert_eq!(habit_name, "Read");
            }
            other => panic!("unexpected issue: {other}"),
        }

        let (habits, completions) = habits_and_completions(&inner).await;
        assert_eq!(completions.len(), 2);
        assert!(completions
            .iter()
            .all(|c| habit_name(&habits, c.habit_id) == "Meditate"));
    }

    #[tokio::test]
    async fn test_failed_habit_write_does_not_abort_run() {
        let inner = SqliteStore::open_in_memory().unwrap();
        let ids = seed_legacy(&inner, SCENARIO).await;
        let mut store = FaultyStore::new(inner.clone());
        store.fail_habit_names = vec!["Read"];

        let outcome = migrate_habit_data(&store).await.unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.habits_created, 1);
        assert_eq!(report.completions_created, 2);
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues.iter().any(|i| matches!(
            i,
            MigrationIssue::HabitWriteFailed { habit_name, .. } if habit_name == "Read"
        )));
        assert!(report.issues.iter().any(|i| matches!(
            i,
            MigrationIssue::UnresolvedHabitReference { record_id, .. } if *record_id == ids[2]
        )));
    }

    #[tokio::test]
    async fn test_failed_completion_write_is_reported_with_context() {
        let inner = SqliteStore::open_in_memory().unwrap();
        let ids = seed_legacy(&inner, SCENARIO).await;
        let mut store = FaultyStore::new(inner.clone());
        store.fail_completion_dates = vec!["2024-01-02"];

        let outcome = migrate_habit_data(&store).await.unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.habits_created, 2);
        assert_eq!(report.completions_created, 2);
        assert_eq!(report.issues.len(), 1);
        match &report.issues[0] {
            MigrationIssue::CompletionWriteFailed {
                record_id,
                habit_name,
                ..
            } => {
                assert_eq!(*record_id, ids[1]);
                assert_eq!(habit_name, "Meditate");
            }
            other => panic!("unexpected issue: {other}"),
        }

        let (_, completions) = habits_and_completions(&inner).await;
        assert_eq!(completions.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_legacy_record_is_reported() {
        let inner = SqliteStore::open_in_memory().unwrap();
        seed_legacy(&inner, SCENARIO).await;
        let broken = inner.new_id();
        inner
            .transact(vec![
                TxOp::update(Namespace::HabitTracks, broken, &json!({ "date": "2024-01-05" }))
                    .unwrap(),
            ])
            .await
            .unwrap();

        let outcome = migrate_habit_data(&inner).await.unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.legacy_records, 4);
        assert_eq!(report.completions_created, 3);
        assert!(matches!(
            report.issues.as_slice(),
            [MigrationIssue::MalformedLegacyRecord { record_id, .. }] if *record_id == broken
        ));
    }

    #[tokio::test]
    async fn test_missing_completed_flag_reads_as_false() {
        let inner = SqliteStore::open_in_memory().unwrap();
        let id = inner.new_id();
        inner
            .transact(vec![
                TxOp::update(
                    Namespace::HabitTracks,
                    id,
                    &json!({ "habitName": "Walk", "date": "2024-01-01", "createdAt": "t1" }),
                )
                .unwrap(),
            ])
            .await
            .unwrap();

        let outcome = migrate_habit_data(&inner).await.unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.habits_created, 1);
        assert_eq!(report.completions_created, 1);
        assert!(report.issues.is_empty());

        let (habits, completions) = habits_and_completions(&inner).await;
        assert_eq!(habits.len(), 1);
        assert_eq!(completions.len(), 1);
        assert!(!completions[0].completed);
        assert_eq!(completions[0].date, "2024-01-01");
        assert_eq!(habit_name(&habits, completions[0].habit_id), "Walk");
    }

    #[tokio::test]
    async fn test_read_failure_is_fatal() {
        let mut store = FaultyStore::new(SqliteStore::open_in_memory().unwrap());
        store.fail_reads = true;
        let err = migrate_habit_data(&store).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read legacy habit data"));
        assert!(store.write_log().is_empty());
    }

    #[tokio::test]
    async fn test_migration_keeps_legacy_records() {
        let inner = SqliteStore::open_in_memory().unwrap();
        seed_legacy(&inner, SCENARIO).await;
        migrate_habit_data(&inner).await.unwrap();
        let legacy = inner.query(&[Namespace::HabitTracks]).await.unwrap();
        assert_eq!(legacy.entities(Namespace::HabitTracks).len(), 3);
    }

    #[tokio::test]
    async fn test_cleanup_refuses_before_migration() {
        let inner = SqliteStore::open_in_memory().unwrap();
        seed_legacy(&inner, SCENARIO).await;

        let err = cleanup_legacy_records(&inner).await.unwrap_err();
        assert!(err.to_string().contains("run the migration first"));
        let legacy = inner.query(&[Namespace::HabitTracks]).await.unwrap();
        assert_eq!(legacy.entities(Namespace::HabitTracks).len(), 3);
    }

    #[tokio::test]
    async fn test_cleanup_after_migration() {
        let inner = SqliteStore::open_in_memory().unwrap();
        seed_legacy(&inner, SCENARIO).await;
        migrate_habit_data(&inner).await.unwrap();

        let report = cleanup_legacy_records(&inner).await.unwrap();
        assert_eq!(report.legacy_records, 3);
        assert_eq!(report.deleted, 3);
        assert!(report.issues.is_empty());

        let result = inner
            .query(&[Namespace::HabitTracks, Namespace::HabitCompletions])
            .await
            .unwrap();
        assert!(result.entities(Namespace::HabitTracks).is_empty());
        assert_eq!(result.entities(Namespace::HabitCompletions).len(), 3);

        let again = cleanup_legacy_records(&inner).await.unwrap();
        assert_eq!(again.deleted, 0);
    }
}
