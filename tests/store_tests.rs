//! Integration tests for the task store.
//!
//! These tests run against an in-memory SQLite database and check the
//! completion-timestamp and cascade-delete invariants.

use chrono::{DateTime, Duration, TimeZone, Utc};
use task_calendar::db::Database;
use task_calendar::error::{AppError, Entity, ErrorCode};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

mod task_tests {
    use super::*;

    #[test]
    fn create_task_trims_title_and_drops_blank_description() {
        let db = setup_db();

        let task = db
            .create_task("  Buy milk  ", Some("   ".to_string()), None)
            .expect("Failed to create task");

        assert_eq!(task.title, "Buy milk");
        assert!(task.description.is_none());
        assert!(task.image_path.is_none());
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn create_task_with_empty_title_persists_nothing() {
        let db = setup_db();

        for title in ["", "   ", "\t\n"] {
            let err = db
                .create_task(title, Some("desc".to_string()), None)
                .unwrap_err();
            assert!(matches!(err, AppError::Validation { field: "title", .. }));
            assert_eq!(err.code(), ErrorCode::MissingRequiredField);
        }

        assert_eq!(db.count_tasks().unwrap().total, 0);
        assert!(db.list_incomplete().unwrap().is_empty());
    }

    #[test]
    fn get_unknown_task_is_not_found() {
        let db = setup_db();

        let err = db.get_task(42).unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: Entity::Task,
                id: 42
            }
        ));
    }

    #[test]
    fn completion_flag_and_timestamp_move_together() {
        let db = setup_db();
        let task = db.create_task("Write report", None, None).unwrap();

        for _ in 0..5 {
            let toggled = db.toggle_task_completion(task.id).unwrap();
            assert_eq!(toggled.completed, toggled.completed_at.is_some());

            let stored = db.get_task(task.id).unwrap();
            assert_eq!(stored, toggled);
        }

        // Odd number of toggles leaves the task completed.
        assert!(db.get_task(task.id).unwrap().completed);
    }

    #[test]
    fn set_completion_clears_timestamp() {
        let db = setup_db();
        let task = db.create_task("Call mom", None, None).unwrap();

        let done = db.set_task_completion(task.id, true).unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());

        let undone = db.set_task_completion(task.id, false).unwrap();
        assert!(!undone.completed);
        assert!(undone.completed_at.is_none());
    }

    #[test]
    fn recompleting_keeps_original_timestamp() {
        let db = setup_db();
        let task = db
            .create_task_at("Pay rent", None, None, at(2024, 3, 1, 8))
            .unwrap();

        let first = db
            .set_task_completion_at(task.id, true, at(2024, 3, 2, 9))
            .unwrap();
        let second = db
            .set_task_completion_at(task.id, true, at(2024, 3, 9, 9))
            .unwrap();

        assert_eq!(first.completed_at, Some(at(2024, 3, 2, 9)));
        assert_eq!(second.completed_at, first.completed_at);
    }

    #[test]
    fn completion_is_never_before_creation() {
        let db = setup_db();
        let created = at(2024, 5, 10, 12);
        let task = db.create_task_at("Future task", None, None, created).unwrap();

        let done = db
            .set_task_completion_at(task.id, true, created - Duration::days(3))
            .unwrap();

        assert_eq!(done.completed_at, Some(created));
    }

    #[test]
    fn completing_unknown_task_is_not_found() {
        let db = setup_db();

        assert!(matches!(
            db.set_task_completion(7, true),
            Err(AppError::NotFound { id: 7, .. })
        ));
        assert!(matches!(
            db.toggle_task_completion(7),
            Err(AppError::NotFound { id: 7, .. })
        ));
    }

    #[test]
    fn lists_split_and_order_tasks() {
        let db = setup_db();
        let old = db
            .create_task_at("Old", None, None, at(2024, 1, 1, 8))
            .unwrap();
        let mid = db
            .create_task_at("Mid", None, None, at(2024, 1, 2, 8))
            .unwrap();
        let new = db
            .create_task_at("New", None, None, at(2024, 1, 3, 8))
            .unwrap();

        db.set_task_completion_at(new.id, true, at(2024, 1, 4, 8))
            .unwrap();
        db.set_task_completion_at(old.id, true, at(2024, 1, 5, 8))
            .unwrap();

        let incomplete: Vec<i64> = db
            .list_incomplete()
            .unwrap()
            .iter()
            .map(|t| t.task.id)
            .collect();
        assert_eq!(incomplete, vec![mid.id]);

        // Newest completion first, regardless of creation order.
        let completed: Vec<i64> = db
            .list_completed()
            .unwrap()
            .iter()
            .map(|t| t.task.id)
            .collect();
        assert_eq!(completed, vec![old.id, new.id]);

        let counts = db.count_tasks().unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.completed, 2);
        assert_eq!(counts.subtasks, 0);
    }
}

mod subtask_tests {
    use super::*;

    #[test]
    fn subtasks_list_oldest_first() {
        let db = setup_db();
        let task = db
            .create_task_at("Trip", None, None, at(2024, 6, 1, 8))
            .unwrap();

        let b = db
            .create_subtask_at(task.id, "Book hotel", at(2024, 6, 1, 10))
            .unwrap();
        let a = db
            .create_subtask_at(task.id, "Buy tickets", at(2024, 6, 1, 9))
            .unwrap();

        let ids: Vec<i64> = db
            .list_subtasks(task.id)
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![a.id, b.id]);

        let with_subtasks = db.get_task_with_subtasks(task.id).unwrap();
        assert_eq!(with_subtasks.subtasks.len(), 2);
        assert_eq!(with_subtasks.completed_subtasks(), 0);
    }

    #[test]
    fn subtask_validation_and_missing_parent() {
        let db = setup_db();
        let task = db.create_task("Parent", None, None).unwrap();

        assert!(matches!(
            db.create_subtask(task.id, "  "),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            db.create_subtask(999, "Orphan"),
            Err(AppError::NotFound {
                entity: Entity::Task,
                id: 999
            })
        ));
        assert_eq!(db.count_tasks().unwrap().subtasks, 0);
    }

    #[test]
    fn subtask_completion_invariant_holds_after_toggles() {
        let db = setup_db();
        let task = db.create_task("Parent", None, None).unwrap();
        let subtask = db.create_subtask(task.id, "Child").unwrap();

        let on = db.toggle_subtask_completion(subtask.id).unwrap();
        assert!(on.completed && on.completed_at.is_some());

        let off = db.toggle_subtask_completion(subtask.id).unwrap();
        assert!(!off.completed && off.completed_at.is_none());

        let on_again = db.set_subtask_completion(subtask.id, true).unwrap();
        assert!(on_again.completed && on_again.completed_at.is_some());

        assert!(matches!(
            db.toggle_subtask_completion(12345),
            Err(AppError::NotFound {
                entity: Entity::Subtask,
                ..
            })
        ));
    }

    #[test]
    fn delete_subtask_returns_owner() {
        let db = setup_db();
        let task = db.create_task("Parent", None, None).unwrap();
        let keep = db.create_subtask(task.id, "Keep").unwrap();
        let removed = db.create_subtask(task.id, "Drop").unwrap();

        assert_eq!(db.delete_subtask(removed.id).unwrap(), task.id);
        assert!(matches!(
            db.get_subtask(removed.id),
            Err(AppError::NotFound { .. })
        ));
        assert_eq!(db.list_subtasks(task.id).unwrap(), vec![keep]);
        assert!(db.delete_subtask(removed.id).is_err());
    }
}

mod cascade_tests {
    use super::*;

    #[test]
    fn deleting_task_removes_all_subtasks() {
        let db = setup_db();
        let task = db
            .create_task("Move house", None, Some("20240101080000_box.png".to_string()))
            .unwrap();
        let other = db.create_task("Unrelated", None, None).unwrap();
        db.create_subtask(other.id, "Stays").unwrap();

        for i in 0..4 {
            db.create_subtask(task.id, &format!("Step {i}")).unwrap();
        }

        let deleted = db.delete_task(task.id).unwrap();
        assert_eq!(deleted.id, task.id);
        assert_eq!(deleted.subtasks_removed, 4);
        assert_eq!(
            deleted.image_path.as_deref(),
            Some("20240101080000_box.png")
        );

        assert!(matches!(
            db.list_subtasks(task.id),
            Err(AppError::NotFound {
                entity: Entity::Task,
                ..
            })
        ));
        assert!(db.get_task(task.id).is_err());

        let counts = db.count_tasks().unwrap();
        assert_eq!(counts.total, 1);
        assert_eq!(counts.subtasks, 1);
    }

    #[test]
    fn deleting_unknown_task_is_not_found() {
        let db = setup_db();

        assert!(matches!(
            db.delete_task(5),
            Err(AppError::NotFound { id: 5, .. })
        ));
    }

    #[test]
    fn file_database_enforces_foreign_keys() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("todo.db");

        let db = Database::open(&path).unwrap();
        let task = db.create_task("Persisted", None, None).unwrap();
        db.create_subtask(task.id, "Child").unwrap();
        drop(db);

        // Reopening runs migrations again without touching existing rows.
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_subtasks(task.id).unwrap().len(), 1);

        let orphan = db.with_conn(|conn| {
            Ok(conn.execute(
                "INSERT INTO subtasks (task_id, title, created_at, completed) VALUES (999, 'x', 0, 0)",
                [],
            ))
        });
        assert!(orphan.unwrap().is_err());
    }
}
