use cefr_core::document::FormatError;
use cefr_core::model::{Level, QuizMode, SelfGrade, VocabularyItem};
use cefr_core::time::{fixed_clock, fixed_now};
use chrono::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{AppServices, Clock, ProgressError};

async fn seeded(app: &AppServices) {
    let progress = app.progress();
    progress
        .set_word_mode_score(Level::A1, "apple", QuizMode::WordToMeaning, SelfGrade::Correct)
        .await
        .unwrap();
    progress
        .set_word_mode_score(Level::A1, "apple", QuizMode::WordToMeaning, SelfGrade::Partial)
        .await
        .unwrap();
    progress
        .set_word_mode_score(Level::B1, "a|b", QuizMode::Listening, SelfGrade::Wrong)
        .await
        .unwrap();
    progress.mark_grammar_read(Level::A2, "past simple").await.unwrap();
    progress.mark_grammar_read(Level::A2, "past simple").await.unwrap();
}

#[tokio::test]
async fn export_then_import_into_a_fresh_store() {
    let source = AppServices::in_memory(fixed_clock());
    seeded(&source).await;
    let json = source.serializer().export_json().await.unwrap();

    let target = AppServices::in_memory(Clock::fixed(fixed_now() + Duration::days(2)));
    target
        .progress()
        .set_word_mode_score(Level::B2, "stale", QuizMode::MeaningToWord, SelfGrade::Correct)
        .await
        .unwrap();
    let imported = target.serializer().import_json(&json).await.unwrap();
    assert_eq!(imported.word_score_count(), 2);
    assert_eq!(imported.grammar_read_count(), 1);

    let apple = target
        .progress()
        .word_mode_score(Level::A1, "apple", QuizMode::WordToMeaning)
        .await
        .unwrap();
    assert_eq!((apple.score, apple.attempts), (5, 2));

    let piped = target
        .progress()
        .word_mode_score(Level::B1, "a|b", QuizMode::Listening)
        .await
        .unwrap();
    assert_eq!((piped.score, piped.attempts), (0, 1));

    let stale = target
        .progress()
        .word_mode_score(Level::B2, "stale", QuizMode::MeaningToWord)
        .await
        .unwrap();
    assert!(!stale.is_seen());

    let again = target.serializer().export().await.unwrap();
    let before = source.serializer().export().await.unwrap();
    assert_eq!(again.word_scores(), before.word_scores());
    assert_eq!(again.grammar_reads(), before.grammar_reads());
}

#[tokio::test]
async fn missing_section_leaves_store_untouched() {
    let app = AppServices::in_memory(fixed_clock());
    seeded(&app).await;
    let before = app.serializer().export().await.unwrap();

    let err = app
        .serializer()
        .import_json(r#"{"version":1,"exported_at":"2024-01-01T00:00:00Z","word_scores":{}}"#)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Format(FormatError::MissingSection("grammar_reads"))
    ));

    let after = app.serializer().export().await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn one_bad_entry_rejects_the_whole_document() {
    let app = AppServices::in_memory(fixed_clock());
    seeded(&app).await;
    let before = app.serializer().export().await.unwrap();

    let doc = r#"{
        "version": 1,
        "word_scores": {
            "A1|pear|1": {"score": 10, "attempts": 1, "updated_at": "2024-01-01T00:00:00Z"},
            "C1|pear|1": {"score": 10, "attempts": 1, "updated_at": "2024-01-01T00:00:00Z"}
        },
        "grammar_reads": {}
    }"#;
    let err = app.serializer().import_json(doc).await.unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Format(FormatError::InvalidKey { .. })
    ));
    assert_eq!(app.serializer().export().await.unwrap(), before);
}

#[tokio::test]
async fn empty_sections_clear_the_store() {
    let app = AppServices::in_memory(fixed_clock());
    seeded(&app).await;

    app.serializer()
        .import_json(r#"{"version":1,"word_scores":{},"grammar_reads":{}}"#)
        .await
        .unwrap();

    let doc = app.serializer().export().await.unwrap();
    assert_eq!(doc.word_score_count(), 0);
    assert_eq!(doc.grammar_read_count(), 0);
}

#[tokio::test]
async fn sqlite_store_round_trips_through_a_document() {
    let url = "sqlite:file:services_transfer?mode=memory&cache=shared";
    let durable = AppServices::new_sqlite(url, fixed_clock()).await.unwrap();
    seeded(&durable).await;
    let json = durable.serializer().export_json().await.unwrap();

    let volatile = AppServices::in_memory(fixed_clock());
    volatile.serializer().import_json(&json).await.unwrap();
    let totals = volatile
        .aggregator()
        .get_all_word_totals(Level::A1, &["apple"])
        .await
        .unwrap();
    assert_eq!(totals["apple"], 9);

    durable
        .serializer()
        .import_json(r#"{"version":1,"word_scores":{},"grammar_reads":{}}"#)
        .await
        .unwrap();
    let reread = durable
        .progress()
        .grammar_read_stats(Level::A2, &["past simple"])
        .await
        .unwrap();
    assert_eq!(reread.read_unique, 0);
}

#[tokio::test]
async fn extreme_imported_scores_do_not_break_selection() {
    let app = AppServices::in_memory(fixed_clock());
    let doc = r#"{
        "version": 1,
        "word_scores": {
            "A1|low|1": {"score": -9223372036854775808, "attempts": 1, "updated_at": "2024-01-01T00:00:00Z"},
            "A1|low|2": {"score": -9223372036854775808, "attempts": 1, "updated_at": "2024-01-01T00:00:00Z"},
            "A1|high|1": {"score": 9223372036854775807, "attempts": 1, "updated_at": "2024-01-01T00:00:00Z"},
            "A1|high|2": {"score": 9223372036854775807, "attempts": 1, "updated_at": "2024-01-01T00:00:00Z"}
        },
        "grammar_reads": {}
    }"#;
    app.serializer().import_json(doc).await.unwrap();

    let totals = app
        .aggregator()
        .get_all_word_totals(Level::A1, &["low", "high", "plain"])
        .await
        .unwrap();
    assert_eq!(totals["low"], i64::MIN);
    assert_eq!(totals["high"], i64::MAX);
    assert_eq!(totals["plain"], 5);

    let breakdown = app.progress().word_mode_breakdown(Level::A1, "high").await.unwrap();
    assert_eq!(breakdown.total(), i64::MAX);

    let items = vec![
        VocabularyItem::new("low", "l"),
        VocabularyItem::new("high", "h"),
        VocabularyItem::new("plain", "p"),
    ];
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let index = app
            .selector()
            .choose_weighted_item(Level::A1, &items, &mut rng)
            .await
            .unwrap();
        assert_ne!(index, 1, "a saturated high total has weight 0");
    }
}
