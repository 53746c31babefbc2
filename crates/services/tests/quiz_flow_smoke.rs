use cefr_core::model::{Level, QuizMode, QuizState, SelfGrade, VocabularyItem};
use cefr_core::time::fixed_clock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{AppServices, PreconditionError, ProgressError};

fn words() -> Vec<VocabularyItem> {
    vec![
        VocabularyItem::new("apple", "a round fruit")
            .with_example("I eat an apple.", "Ich esse einen Apfel."),
        VocabularyItem::new("run", "to move fast"),
        VocabularyItem::new("house", "a building to live in"),
    ]
}

#[tokio::test]
async fn quiz_loop_grades_the_drawn_word() {
    let app = AppServices::in_memory(fixed_clock());
    let items = words();
    let mut rng = StdRng::seed_from_u64(11);

    let mut state = QuizState::Idle;
    for _ in 0..12 {
        let turn = app
            .selector()
            .next_turn(Level::A1, &items, &QuizMode::WITHOUT_LISTENING, &mut rng)
            .await
            .unwrap();
        state = match state {
            QuizState::Idle => state.start(turn),
            _ => state.next(turn).unwrap(),
        };
        state = state.reveal().unwrap();

        let graded = state.gradable_turn().expect("revealed turn");
        let headword = &items[graded.index].headword;
        let stored = app
            .progress()
            .set_word_mode_score(Level::A1, headword, graded.mode, SelfGrade::Correct)
            .await
            .unwrap();
        assert_eq!(stored.score, 10);
    }
    state = state.stop();
    assert_eq!(state, QuizState::Idle);

    let totals = app
        .aggregator()
        .get_all_word_totals(Level::A1, &["apple", "run", "house"])
        .await
        .unwrap();
    assert_eq!(totals.len(), 3);
    assert!(totals.values().all(|t| (5..=50).contains(t)));
    assert!(totals.values().any(|t| *t > 5));
}

#[tokio::test]
async fn weak_words_are_drawn_more_often() {
    let app = AppServices::in_memory(fixed_clock());
    let items = words();
    for mode in QuizMode::WITHOUT_LISTENING {
        app.progress()
            .set_word_mode_score(Level::A1, "apple", mode, SelfGrade::Correct)
            .await
            .unwrap();
    }

    // apple: total 41, weight 10. run and house: total 5, weight 46.
    let mut rng = StdRng::seed_from_u64(99);
    let mut apple = 0;
    for _ in 0..3_000 {
        if app
            .selector()
            .choose_weighted_item(Level::A1, &items, &mut rng)
            .await
            .unwrap()
            == 0
        {
            apple += 1;
        }
    }
    assert!((200..450).contains(&apple), "apple drawn {apple} times");
}

#[tokio::test]
async fn levels_do_not_share_progress() {
    let app = AppServices::in_memory(fixed_clock());
    app.progress()
        .set_word_mode_score(Level::B2, "apple", QuizMode::Listening, SelfGrade::Correct)
        .await
        .unwrap();

    let a1 = app
        .aggregator()
        .get_all_word_totals(Level::A1, &["apple"])
        .await
        .unwrap();
    let b2 = app
        .aggregator()
        .get_all_word_totals(Level::B2, &["apple"])
        .await
        .unwrap();
    assert_eq!(a1["apple"], 5);
    assert_eq!(b2["apple"], 14);
}

#[tokio::test]
async fn empty_inputs_are_precondition_errors() {
    let app = AppServices::in_memory(fixed_clock());
    let mut rng = StdRng::seed_from_u64(1);

    let err = app
        .selector()
        .next_turn(Level::A1, &[], &QuizMode::ALL, &mut rng)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Precondition(PreconditionError::EmptyItems)
    ));

    let err = app.selector().choose_mode(&[], &mut rng).unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Precondition(PreconditionError::NoModesEnabled)
    ));
}

#[tokio::test]
async fn grammar_reads_feed_the_stats() {
    let app = AppServices::in_memory(fixed_clock());
    let progress = app.progress();
    assert_eq!(progress.mark_grammar_read(Level::A2, "past simple").await.unwrap(), 1);
    assert_eq!(progress.mark_grammar_read(Level::A2, "past simple").await.unwrap(), 2);
    progress.mark_grammar_read(Level::A2, "comparatives").await.unwrap();

    let stats = progress
        .grammar_read_stats(Level::A2, &["past simple", "comparatives", "future with going to"])
        .await
        .unwrap();
    assert_eq!((stats.read_unique, stats.total), (2, 3));
}
