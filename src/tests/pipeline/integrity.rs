//! Maintenance Tests
//!
//! Integrity checks, node re-marking and dictionary statistics.

use std::sync::Arc;
use std::time::Duration;

use crate::core::batch::CancelToken;
use crate::core::error::{Error, ValidationError, VerifyError};
use crate::core::flags::WordFlags;
use crate::core::node::{GameMode, NodeCategory};
use crate::core::verify::RetryPolicy;
use crate::core::{Dictionary, NodeMark};
use crate::database::{Database, Store};
use crate::tests::common::{create_test_dictionary, seed_words};
use crate::tests::mocks::{verifier_knowing, FlakyStore};

async fn insert_raw(db: &Database, word: &str, word_index: &str, reverse: &str, flags: i64) {
    sqlx::query(
        "INSERT INTO word_list (word, word_index, reverse_word_index, kkutu_index, flags) VALUES (?, ?, ?, '', ?)",
    )
    .bind(word)
    .bind(word_index)
    .bind(reverse)
    .bind(flags)
    .execute(db.pool())
    .await
    .expect("Failed to insert raw row");
}

// =============================================================================
// Integrity Check
// =============================================================================

#[tokio::test]
async fn test_integrity_removes_and_repairs() {
    let (dictionary, db, _temp) = create_test_dictionary().await;
    seed_words(&dictionary, &["나비"]).await;
    insert_raw(&db, "가", "가", "가", 0).await;
    insert_raw(&db, "가방", "가", "방", 1).await;
    insert_raw(&db, "다라", "X", "라", 0).await;

    let report = dictionary.check_integrity(false, &CancelToken::new()).await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.removed, 1);
    assert_eq!(report.fixed, 2);
    assert_eq!(report.errors, 0);
    assert_eq!(report.deduplicated, 0);
    assert!(!report.cancelled);

    assert!(db.get_word("가").await.unwrap().is_none());
    assert_eq!(db.get_word("가방").await.unwrap().unwrap().word_flags(), WordFlags::NONE);
    assert_eq!(db.get_word("다라").await.unwrap().unwrap().word_index, "다");

    let again = dictionary.check_integrity(false, &CancelToken::new()).await.unwrap();
    assert_eq!(again.removed + again.fixed, 0);
}

#[tokio::test]
async fn test_integrity_drops_unknown_words_online() {
    let (dictionary, db, _temp) = create_test_dictionary().await;
    seed_words(&dictionary, &["나비", "가갸"]).await;
    let retry = RetryPolicy {
        max_attempts: 1,
        settle_delay: Duration::ZERO,
    };
    let dictionary = dictionary.with_verifier(Arc::new(verifier_knowing(&["나비"])), retry);

    let report = dictionary.check_integrity(true, &CancelToken::new()).await.unwrap();

    assert_eq!(report.removed, 1);
    assert!(db.get_word("가갸").await.unwrap().is_none());
    assert!(db.get_word("나비").await.unwrap().is_some());
}

#[tokio::test]
async fn test_integrity_online_requires_verifier() {
    let (dictionary, _db, _temp) = create_test_dictionary().await;
    let err = dictionary.check_integrity(true, &CancelToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Verify(VerifyError::Unavailable)));
}

#[tokio::test]
async fn test_cancelled_integrity_writes_nothing() {
    let (dictionary, db, _temp) = create_test_dictionary().await;
    insert_raw(&db, "가", "가", "가", 0).await;
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = dictionary.check_integrity(false, &cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.removed, 0);
    assert!(db.get_word("가").await.unwrap().is_some());
}

#[tokio::test]
async fn test_integrity_drops_end_nodes_with_successors() {
    let (dictionary, db, _temp) = create_test_dictionary().await;
    let cancel = CancelToken::new();
    dictionary
        .batch_add_words(&["가나", "가늠"], WordFlags::END_WORD, false, &cancel)
        .await
        .unwrap();
    dictionary
        .batch_add_words(&["다라"], WordFlags::REVERSE_END_WORD, false, &cancel)
        .await
        .unwrap();
    seed_words(&dictionary, &["나비", "바다"]).await;

    let report = dictionary.check_integrity(false, &cancel).await.unwrap();

    assert_eq!(report.invalid_end_nodes, 2);
    assert_eq!(report.fixed, 2);
    let index = dictionary.node_index();
    assert!(!index.contains("나", NodeCategory::End));
    assert!(!index.contains("다", NodeCategory::ReverseEnd));
    assert!(index.contains("늠", NodeCategory::End));
    assert_eq!(db.list_nodes(NodeCategory::End).await.unwrap(), vec!["늠"]);
    assert!(db.list_nodes(NodeCategory::ReverseEnd).await.unwrap().is_empty());
    assert_eq!(db.get_word("가나").await.unwrap().unwrap().word_flags(), WordFlags::NONE);
    assert_eq!(db.get_word("다라").await.unwrap().unwrap().word_flags(), WordFlags::NONE);
    assert_eq!(db.get_word("가늠").await.unwrap().unwrap().word_flags(), WordFlags::END_WORD);

    let again = dictionary.check_integrity(false, &cancel).await.unwrap();
    assert_eq!(again.invalid_end_nodes, 0);
}

#[tokio::test]
async fn test_integrity_drops_long_end_node_with_successor() {
    let (dictionary, db, _temp) = create_test_dictionary().await;
    seed_words(&dictionary, &["사과나무", "과나리아"]).await;
    assert!(dictionary.mark_node("사과나무", GameMode::Long, NodeMark::End).await.unwrap());

    let report = dictionary.check_integrity(false, &CancelToken::new()).await.unwrap();

    assert_eq!(report.invalid_end_nodes, 1);
    assert_eq!(report.fixed, 0);
    assert!(!dictionary.node_index().contains("과나", NodeCategory::LongEnd));
    assert!(db.list_nodes(NodeCategory::LongEnd).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_removed_words_do_not_invalidate_end_nodes() {
    let (dictionary, db, _temp) = create_test_dictionary().await;
    dictionary
        .batch_add_words(&["가나"], WordFlags::END_WORD, false, &CancelToken::new())
        .await
        .unwrap();
    insert_raw(&db, "나", "나", "나", 0).await;

    let report = dictionary.check_integrity(false, &CancelToken::new()).await.unwrap();

    assert_eq!(report.removed, 1);
    assert_eq!(report.invalid_end_nodes, 0);
    assert!(dictionary.node_index().contains("나", NodeCategory::End));
}

// =============================================================================
// Node Marking
// =============================================================================

#[tokio::test]
async fn test_mark_node_moves_between_sets() {
    let (dictionary, db, _temp) = create_test_dictionary().await;
    seed_words(&dictionary, &["가방"]).await;
    let index = dictionary.node_index();

    assert!(dictionary.mark_node("가방", GameMode::Standard, NodeMark::End).await.unwrap());
    assert!(index.contains("방", NodeCategory::End));

    assert!(dictionary.mark_node("가방", GameMode::Standard, NodeMark::Attack).await.unwrap());
    assert!(!index.contains("방", NodeCategory::End));
    assert!(index.contains("방", NodeCategory::Attack));
    assert_eq!(db.list_nodes(NodeCategory::Attack).await.unwrap(), vec!["방"]);

    assert!(dictionary.mark_node("가방", GameMode::Standard, NodeMark::Normal).await.unwrap());
    assert!(!dictionary.mark_node("가방", GameMode::Standard, NodeMark::Normal).await.unwrap());
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_marked_flags_applied_by_integrity_check() {
    let (dictionary, db, _temp) = create_test_dictionary().await;
    seed_words(&dictionary, &["사과나무"]).await;

    dictionary.mark_node("사과나무", GameMode::Long, NodeMark::End).await.unwrap();
    assert!(dictionary.node_index().contains("과나", NodeCategory::LongEnd));
    assert_eq!(db.get_word("사과나무").await.unwrap().unwrap().word_flags(), WordFlags::NONE);

    let report = dictionary.check_integrity(false, &CancelToken::new()).await.unwrap();
    assert_eq!(report.fixed, 1);
    assert_eq!(
        db.get_word("사과나무").await.unwrap().unwrap().word_flags(),
        WordFlags::LONG_END_WORD
    );
}

#[tokio::test]
async fn test_failed_mark_leaves_index_unchanged() {
    let (_dictionary, db, _temp) = create_test_dictionary().await;
    let store = FlakyStore::new(db.clone());
    let dictionary = Dictionary::open(Arc::new(store.clone())).await.unwrap();
    seed_words(&dictionary, &["가방"]).await;
    assert!(dictionary.mark_node("가방", GameMode::Standard, NodeMark::Attack).await.unwrap());
    store.fail_commit();

    let err = dictionary.mark_node("가방", GameMode::Standard, NodeMark::End).await.unwrap_err();

    assert!(matches!(err, Error::Store(_)));
    let index = dictionary.node_index();
    assert!(index.contains("방", NodeCategory::Attack));
    assert!(!index.contains("방", NodeCategory::End));
    assert_eq!(db.list_nodes(NodeCategory::Attack).await.unwrap(), vec!["방"]);
    assert!(db.list_nodes(NodeCategory::End).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_node_undefined_for_mode() {
    let (dictionary, _db, _temp) = create_test_dictionary().await;
    let err = dictionary.mark_node("가나", GameMode::Middle, NodeMark::End).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::UndefinedNode { .. })));
}

// =============================================================================
// Statistics
// =============================================================================

#[tokio::test]
async fn test_stats_report_words_and_nodes() {
    let (dictionary, _db, _temp) = create_test_dictionary().await;
    dictionary
        .batch_add_words(&["가나", "다라"], WordFlags::END_WORD, false, &CancelToken::new())
        .await
        .unwrap();

    let stats = dictionary.stats().await.unwrap();
    assert_eq!(stats.words, 2);
    assert_eq!(stats.nodes.len(), NodeCategory::ALL.len());
    assert_eq!(stats.nodes[NodeCategory::End.index()], (NodeCategory::End, 2));
    assert_eq!(stats.nodes[NodeCategory::Attack.index()], (NodeCategory::Attack, 0));
}
