//! Tests for Q-table persistence on disk

use std::{fs, sync::Arc};

use tabq::{
    Action, DecisionLoop, Error, Outcome, QTable, TableStore,
    adapters::MsgPackRepository,
    app::{AgentConfig, App},
    ports::TableRepository,
    q_learning::SavedQTable,
};
use tempfile::TempDir;

fn trained_table() -> QTable {
    let mut table = QTable::zeros(4, 3).expect("Failed to create table");
    table.update(2, 1, 1.0, 3, 0.4, 0.9).expect("Failed to update");
    table.update(3, 2, 0.2, 1, 0.4, 0.9).expect("Failed to update");
    table.update(1, 0, -1.0, 2, 0.4, 0.9).expect("Failed to update");
    table
}

#[test]
fn test_table_save_load_roundtrip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("agent.qtable");
    let store = TableStore::new(Arc::new(MsgPackRepository::new()), &file_path, (4, 3));

    let table = trained_table();
    store.save(&table).expect("Failed to save table");
    assert!(file_path.exists(), "Saved file should exist");

    let loaded = store.load().expect("Failed to load table");
    assert_eq!(loaded, table);
}

#[test]
fn test_saving_twice_produces_identical_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let first_path = temp_dir.path().join("first.qtable");
    let second_path = temp_dir.path().join("second.qtable");
    let repo = MsgPackRepository::new();
    let saved = SavedQTable::from_table(&trained_table());

    repo.save(&saved, &first_path).expect("Failed to save");
    repo.save(&saved, &second_path).expect("Failed to save");

    let first = fs::read(&first_path).expect("Failed to read");
    let second = fs::read(&second_path).expect("Failed to read");
    assert_eq!(first, second);
}

#[test]
fn test_missing_file_loads_zero_table() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = TableStore::new(
        Arc::new(MsgPackRepository::new()),
        temp_dir.path().join("never-written.qtable"),
        (8, 6),
    );
    assert_eq!(store.load().unwrap(), QTable::zeros(8, 6).unwrap());
}

#[test]
fn test_stored_shape_must_match_configuration() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("agent.qtable");
    let repo = Arc::new(MsgPackRepository::new());

    TableStore::new(repo.clone(), &file_path, (4, 3))
        .save(&trained_table())
        .expect("Failed to save");

    let err = TableStore::new(repo, &file_path, (8, 6)).load().unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}

#[test]
fn test_truncated_file_is_reported_as_corrupt() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("agent.qtable");
    let repo = MsgPackRepository::new();
    repo.save(&SavedQTable::from_table(&trained_table()), &file_path)
        .expect("Failed to save");

    let bytes = fs::read(&file_path).expect("Failed to read");
    fs::write(&file_path, &bytes[..bytes.len() / 2]).expect("Failed to truncate");

    let err = repo.load(&file_path).unwrap_err();
    assert!(err.is_persistence_error());
}

#[test]
fn test_session_resumes_from_saved_table() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("agent.qtable");
    let app = App::new();
    let config = AgentConfig::default()
        .with_seed(3)
        .with_persist_path(&file_path)
        .with_snapshot_every(5);

    let mut agent: DecisionLoop = app.create_agent(config.clone()).unwrap();
    let mut effector = |action: Action| match action {
        Action::Replenish => Some(Outcome::FailedPrecondition),
        _ => Some(Outcome::Succeeded),
    };
    for tick in 0..20u32 {
        agent
            .tick(&[tick % 2 == 0, tick % 5 != 0], &mut effector)
            .unwrap();
    }
    assert_eq!(agent.stats().snapshots_saved, 4);
    let first_session = agent.shutdown();

    let resumed = app.create_agent(config).unwrap();
    assert_eq!(resumed.table(), &first_session);
    assert!(resumed.previous().is_none());
}
