use std::sync::Arc;

use cefr_core::model::{
    GrammarReadKey, GrammarReadRecord, Level, ProgressSnapshot, QuizMode, WordScoreKey,
    WordScoreRecord,
};
use cefr_core::time::fixed_now;
use chrono::Duration;
use storage::repository::{
    GrammarReadRepository, ProgressSnapshotRepository, Storage, StorageError,
    WordScoreRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_word_scores_overwrite_and_count() {
    let repo = connect("memdb_word_scores").await;
    let key = WordScoreKey::new(Level::A1, "apple", QuizMode::WordToMeaning);

    assert!(repo.get_word_score(&key).await.unwrap().is_none());

    let first = repo.record_word_score(&key, 10, fixed_now()).await.unwrap();
    assert_eq!((first.score, first.attempts), (10, 1));

    let later = fixed_now() + Duration::minutes(3);
    let second = repo.record_word_score(&key, 0, later).await.unwrap();
    assert_eq!((second.score, second.attempts), (0, 2));
    assert_eq!(second.updated_at, later);

    let fetched = repo.get_word_score(&key).await.unwrap().expect("stored");
    assert_eq!(fetched, second);

    let other_level = WordScoreKey::new(Level::A2, "apple", QuizMode::WordToMeaning);
    repo.record_word_score(&other_level, 5, later).await.unwrap();
    let a1 = repo.word_scores_for_level(Level::A1).await.unwrap();
    assert_eq!(a1.len(), 1);
    assert_eq!(a1[0].key, key);
}

#[tokio::test]
async fn sqlite_grammar_reads_increment() {
    let repo = connect("memdb_grammar_reads").await;
    let key = GrammarReadKey::new(Level::B1, "reported speech");

    let first = repo.mark_read(&key, fixed_now()).await.unwrap();
    assert_eq!(first.read_count, 1);
    let later = fixed_now() + Duration::days(1);
    let second = repo.mark_read(&key, later).await.unwrap();
    assert_eq!(second.read_count, 2);
    assert_eq!(second.last_read_at, later);

    assert_eq!(repo.get_read(&key).await.unwrap(), Some(second));
    let names = repo.read_names_for_level(Level::B1).await.unwrap();
    assert!(names.contains("reported speech"));
    assert!(repo.read_names_for_level(Level::A1).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_replace_all_swaps_contents() {
    let repo = connect("memdb_replace_all").await;
    repo.record_word_score(
        &WordScoreKey::new(Level::A1, "stale", QuizMode::Listening),
        5,
        fixed_now(),
    )
    .await
    .unwrap();

    let incoming = ProgressSnapshot {
        word_scores: vec![
            WordScoreRecord {
                key: WordScoreKey::new(Level::A1, "pipe|separated", QuizMode::MeaningToWord),
                score: 10,
                attempts: 4,
                updated_at: fixed_now(),
            },
            WordScoreRecord {
                key: WordScoreKey::new(Level::B2, "notwithstanding", QuizMode::WordToMeaning),
                score: 0,
                attempts: 1,
                updated_at: fixed_now(),
            },
        ],
        grammar_reads: vec![GrammarReadRecord {
            key: GrammarReadKey::new(Level::A2, "comparatives"),
            read_count: 2,
            last_read_at: fixed_now(),
        }],
    };
    repo.replace_all(&incoming).await.unwrap();

    let snapshot = repo.snapshot().await.unwrap();
    assert_eq!(snapshot, incoming.sorted());
}

#[tokio::test]
async fn sqlite_failed_replace_all_keeps_previous_rows() {
    let repo = connect("memdb_replace_rollback").await;
    let keep = WordScoreKey::new(Level::A1, "keep", QuizMode::WordToMeaning);
    repo.record_word_score(&keep, 10, fixed_now()).await.unwrap();
    repo.mark_read(&GrammarReadKey::new(Level::A1, "articles"), fixed_now())
        .await
        .unwrap();
    let before = repo.snapshot().await.unwrap();

    let twice = WordScoreRecord {
        key: WordScoreKey::new(Level::A2, "twice", QuizMode::Listening),
        score: 5,
        attempts: 1,
        updated_at: fixed_now(),
    };
    let incoming = ProgressSnapshot {
        word_scores: vec![twice.clone(), twice],
        grammar_reads: Vec::new(),
    };
    // The second insert fails after both tables were already cleared.
    let err = repo.replace_all(&incoming).await.unwrap_err();
    assert!(matches!(err, StorageError::Constraint(_)), "{err:?}");

    assert_eq!(repo.snapshot().await.unwrap(), before);
    let kept = repo.get_word_score(&keep).await.unwrap().expect("row survives");
    assert_eq!((kept.score, kept.attempts), (10, 1));
}

#[tokio::test]
async fn sqlite_storage_bundle_migrates_once() {
    let url = "sqlite:file:memdb_bundle?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.expect("storage");
    // A second bootstrap against the same database must not re-run migration 1.
    let again = SqliteRepository::connect(url).await.expect("connect");
    again.migrate().await.expect("migrate twice");

    let key = GrammarReadKey::new(Level::A1, "there is");
    storage.grammar_reads.mark_read(&key, fixed_now()).await.unwrap();
    assert_eq!(
        storage.snapshots.snapshot().await.unwrap().grammar_reads.len(),
        1
    );
}

#[tokio::test]
async fn sqlite_file_store_survives_reconnect_and_concurrent_grading() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("progress.sqlite3").display()
    );
    let key = WordScoreKey::new(Level::B1, "concurrent", QuizMode::SentenceToTranslation);

    {
        let storage = Storage::sqlite(&url).await.expect("storage");
        let mut handles = Vec::new();
        for i in 0..16_i64 {
            let repo = Arc::clone(&storage.word_scores);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                repo.record_word_score(&key, (i % 3) * 5, fixed_now()).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("record");
        }
    }

    let reopened = Storage::sqlite(&url).await.expect("reopen");
    let stored = reopened
        .word_scores
        .get_word_score(&key)
        .await
        .unwrap()
        .expect("persisted");
    assert_eq!(stored.attempts, 16);
}
