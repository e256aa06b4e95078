//! Reader state survives teardown and reconstruction
//!
//! Uses a real database file so the SQLite stores are exercised end to end.

use std::sync::Arc;
use std::time::Duration;

use lectio_common::db::init_database;
use lectio_common::events::{EventBus, TimerState};
use lectio_common::{ChapterAddress, ReaderBehavior, RepeatPolicy};
use lectio_rp::db::{SessionKey, SessionStore, SqliteBehaviorStore, SqliteSessionStore};
use lectio_rp::providers::{ReaderContext, ReadingPlan, SharedCurrentPassage, StaticBible};
use lectio_rp::reader::{PlayerBehaviorState, ReaderDeps};
use sqlx::SqlitePool;

fn deps(db: &SqlitePool, scope: &str) -> ReaderDeps {
    ReaderDeps {
        context: ReaderContext::new(
            Arc::new(StaticBible::canon()),
            Arc::new(SharedCurrentPassage::default()),
            Arc::new(ReadingPlan::empty()),
        ),
        behaviors: Arc::new(SqliteBehaviorStore::new(db.clone())),
        session: Arc::new(SqliteSessionStore::new(db.clone(), scope)),
        events: EventBus::default(),
        tick_interval: Duration::from_millis(20),
    }
}

fn timed_segment(secs: f64) -> ReaderBehavior {
    ReaderBehavior::Segment {
        start: ChapterAddress::new(42, 0),
        length: None,
        policy: RepeatPolicy::Timed(secs),
    }
}

#[tokio::test]
async fn test_index_and_behavior_survive_restart() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("lectio.db");

    {
        let db = init_database(&db_path).await.unwrap();
        let reader = PlayerBehaviorState::load(deps(&db, "default")).await.unwrap();
        reader.set_behavior(timed_segment(900.0)).await.unwrap();
        reader.set_index(12).await.unwrap();
        reader.shutdown().await;
        db.close().await;
    }

    let db = init_database(&db_path).await.unwrap();
    let reader = PlayerBehaviorState::load(deps(&db, "default")).await.unwrap();

    assert_eq!(reader.current_index().await, 12);
    assert_eq!(reader.get_behavior().await.unwrap(), timed_segment(900.0));

    // John 1 + 12 chapters
    let passage = reader.get_section(None).await.unwrap().unwrap();
    assert_eq!(passage.chapter, ChapterAddress::new(42, 12));

    let status = reader.timer_status().await.unwrap();
    assert_eq!(status.state, TimerState::Paused);
    reader.shutdown().await;
}

#[tokio::test]
async fn test_timer_resumes_from_persisted_elapsed() {
    let temp = tempfile::tempdir().unwrap();
    let db = init_database(&temp.path().join("lectio.db")).await.unwrap();

    let reader = PlayerBehaviorState::load(deps(&db, "default")).await.unwrap();
    reader.set_behavior(timed_segment(60.0)).await.unwrap();
    reader.play_timer().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    reader.shutdown().await;

    let session = SqliteSessionStore::new(db.clone(), "default");
    let persisted = session.load(SessionKey::TimerElapsed).await.unwrap().unwrap();
    assert!(persisted > 0.0);

    let restored = PlayerBehaviorState::load(deps(&db, "default")).await.unwrap();
    let status = restored.timer_status().await.unwrap();
    assert_eq!(status.state, TimerState::Paused);
    assert!((status.elapsed - persisted).abs() < 1e-6);
    restored.shutdown().await;
}

#[tokio::test]
async fn test_scopes_keep_separate_sessions() {
    let temp = tempfile::tempdir().unwrap();
    let db = init_database(&temp.path().join("lectio.db")).await.unwrap();

    let morning = PlayerBehaviorState::load(deps(&db, "morning")).await.unwrap();
    morning.set_index(3).await.unwrap();

    let evening = PlayerBehaviorState::load(deps(&db, "evening")).await.unwrap();
    assert_eq!(evening.current_index().await, 0);

    let morning_again = PlayerBehaviorState::load(deps(&db, "morning")).await.unwrap();
    assert_eq!(morning_again.current_index().await, 3);
}
