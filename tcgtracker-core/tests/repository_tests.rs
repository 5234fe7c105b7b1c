mod common;

use common::{base_set_catalogue, harness, FakeCatalogue, USER};
use std::time::Duration;
use tcgtracker_core::*;

async fn next_snapshot(stream: &mut OwnedCardsStream) -> Vec<OwnedCard> {
    tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("stream stalled")
        .expect("stream closed")
}

#[tokio::test]
async fn loads_and_persists_card_detail() {
    let h = harness(FakeCatalogue::new().with_card("base1-1", "Bulbasaur", "Common"));

    let card = h.repo.load_catalogue_card_detail("base1-1").await.unwrap();
    assert_eq!(card.id, "base1-1");
    assert_eq!(card.name, "Bulbasaur");
    assert_eq!(card.rarity, "Common");
    assert!(!card.favourite);
    assert_eq!(card.description, "");
    assert_eq!(card.image_url, "");

    let cached = h.local.get_catalogue_card("base1-1").await.unwrap();
    assert_eq!(cached, Some(card));
}

#[tokio::test]
async fn second_detail_load_is_served_locally() {
    let h = harness(base_set_catalogue());

    let first = h.repo.load_catalogue_card_detail("base1-2").await.unwrap();
    let second = h.repo.load_catalogue_card_detail("base1-2").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.catalogue.detail_calls(), 1);
}

#[tokio::test]
async fn unknown_card_is_not_found_and_not_cached() {
    let h = harness(base_set_catalogue());

    let err = h.repo.load_catalogue_card_detail("nope-9").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    assert!(h.local.list_catalogue_cards().await.unwrap().is_empty());

    // no placeholder was stored, so the next attempt asks the catalogue again
    let _ = h.repo.load_catalogue_card_detail("nope-9").await;
    assert_eq!(h.catalogue.detail_calls(), 2);
}

#[tokio::test]
async fn blank_card_id_is_rejected_without_remote_call() {
    let h = harness(base_set_catalogue());
    let err = h.repo.load_catalogue_card_detail("  ").await.unwrap_err();
    assert!(matches!(err, CoreError::Invalid(_)));
    assert_eq!(h.catalogue.detail_calls(), 0);
}

#[tokio::test]
async fn invalidated_detail_is_fetched_again() {
    let h = harness(base_set_catalogue());
    h.repo.load_catalogue_card_detail("base1-1").await.unwrap();

    assert!(h.repo.invalidate_catalogue_card("base1-1").await.unwrap());
    assert!(!h.repo.invalidate_catalogue_card("base1-1").await.unwrap());

    h.repo.load_catalogue_card_detail("base1-1").await.unwrap();
    assert_eq!(h.catalogue.detail_calls(), 2);
}

#[tokio::test]
async fn summaries_are_fetched_once() {
    let h = harness(base_set_catalogue());

    for _ in 0..3 {
        let cards = h.repo.load_catalogue_summaries().await.unwrap();
        assert_eq!(cards.len(), 4);
    }
    assert_eq!(h.catalogue.list_calls(), 1);

    h.repo.invalidate_summaries();
    h.repo.load_catalogue_summaries().await.unwrap();
    assert_eq!(h.catalogue.list_calls(), 2);
}

#[tokio::test]
async fn empty_summary_list_is_fetched_every_time() {
    let h = harness(FakeCatalogue::new());
    h.repo.load_catalogue_summaries().await.unwrap();
    h.repo.load_catalogue_summaries().await.unwrap();
    assert_eq!(h.catalogue.list_calls(), 2);
}

#[tokio::test]
async fn blank_search_makes_no_remote_calls() {
    let h = harness(base_set_catalogue());

    assert!(h.repo.search_catalogues_by_name("").await.unwrap().is_empty());
    assert!(h.repo.search_catalogues_by_name("   \t").await.unwrap().is_empty());
    assert_eq!(h.catalogue.list_calls(), 0);
    assert_eq!(h.catalogue.detail_calls(), 0);
}

#[tokio::test]
async fn search_matches_case_insensitively_and_drops_failures() {
    let h = harness(base_set_catalogue().with_failing_card("base1-15", "Venusaur"));

    let found = h.repo.search_catalogues_by_name("SAUR").await.unwrap();
    let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Bulbasaur", "Ivysaur"]);

    // one fetch per match, failed one included
    assert_eq!(h.catalogue.detail_calls(), 3);
    // enrichment does not populate the local cache
    assert!(h.local.get_catalogue_card("base1-1").await.unwrap().is_none());
}

#[tokio::test]
async fn search_drops_details_without_id() {
    let h = harness(base_set_catalogue().with_blank_card("base1-58", "Pikachu"));

    assert!(h.repo.search_catalogues_by_name("pika").await.unwrap().is_empty());
    assert_eq!(h.catalogue.detail_calls(), 1);

    let found = h.repo.search_catalogues_by_name("a").await.unwrap();
    assert!(found.iter().all(|c| !c.id.is_empty()));
    assert!(!found.iter().any(|c| c.name.is_empty()));
}

#[tokio::test]
async fn add_writes_locally_before_remote() {
    let h = harness(base_set_catalogue());

    let owned = h.repo.add_card_to_collection("base1-4").await.unwrap();
    assert!(owned.owned);
    assert!(!owned.favourite);
    assert!(!owned.is_unsaved());
    assert_eq!(owned.name, "Charmander");

    assert_eq!(*h.remote.local_before_remote.lock(), vec![true]);
    let doc = h.remote.get_document(USER, "base1-4").await.unwrap();
    assert_eq!(doc, Some(owned));
}

#[tokio::test]
async fn failed_remote_write_keeps_local_record() {
    let h = harness(base_set_catalogue());
    h.remote.set_failing(true);

    let err = h.repo.add_card_to_collection("base1-1").await.unwrap_err();
    assert!(matches!(err, CoreError::Transport(_)));

    let local = h.local.get_owned_card("base1-1").await.unwrap();
    assert!(local.is_some());
    h.remote.set_failing(false);
    assert!(h.remote.get_document(USER, "base1-1").await.unwrap().is_none());
}

#[tokio::test]
async fn add_unknown_card_writes_nothing() {
    let h = harness(base_set_catalogue());

    let err = h.repo.add_card_to_collection("missing-1").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    assert!(h.local.list_owned_cards().await.unwrap().is_empty());
    assert!(h.remote.list_documents(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_add_resolves_everything_before_writing() {
    let h = harness(base_set_catalogue());
    let ids = vec!["base1-1".to_string(), "missing-2".to_string()];

    let err = h.repo.add_cards_to_collection(&ids).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    assert!(h.local.get_owned_card("base1-1").await.unwrap().is_none());
    assert!(h.local.list_owned_cards().await.unwrap().is_empty());
    assert!(h.remote.list_documents(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_add_mirrors_all_cards() {
    let h = harness(base_set_catalogue());
    let ids = vec!["base1-1".to_string(), "base1-2".to_string(), "jungle-1".to_string()];

    let stored = h.repo.add_cards_to_collection(&ids).await.unwrap();
    assert_eq!(stored.len(), 3);

    let remote = h.remote.list_documents(USER).await.unwrap();
    assert_eq!(remote.len(), 3);
    assert!(h.remote.local_before_remote.lock().iter().all(|present| *present));
}

#[tokio::test]
async fn batch_add_of_nothing_is_a_no_op() {
    let h = harness(base_set_catalogue());
    assert!(h.repo.add_cards_to_collection(&[]).await.unwrap().is_empty());
    assert_eq!(h.catalogue.detail_calls(), 0);
}

#[tokio::test]
async fn failed_batch_commit_leaves_local_ahead() {
    let h = harness(base_set_catalogue());
    h.remote.set_failing(true);
    let ids = vec!["base1-1".to_string(), "base1-2".to_string()];

    assert!(h.repo.add_cards_to_collection(&ids).await.is_err());
    assert_eq!(h.local.list_owned_cards().await.unwrap().len(), 2);

    h.remote.set_failing(false);
    assert!(h.remote.list_documents(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn favourite_toggle_round_trips() {
    let h = harness(base_set_catalogue());
    let original = h.repo.add_card_to_collection("base1-1").await.unwrap();

    let toggled = h.repo.toggle_favourite(&original).await.unwrap();
    assert!(toggled.favourite);
    assert_eq!(toggled.local_id, original.local_id);
    assert_eq!(h.local.get_owned_card("base1-1").await.unwrap().as_ref(), Some(&toggled));
    assert_eq!(h.remote.get_document(USER, "base1-1").await.unwrap().as_ref(), Some(&toggled));

    let back = h.repo.toggle_favourite(&toggled).await.unwrap();
    assert_eq!(back, original);
    assert_eq!(h.local.get_owned_card("base1-1").await.unwrap().as_ref(), Some(&back));
    assert_eq!(h.remote.get_document(USER, "base1-1").await.unwrap().as_ref(), Some(&back));

    assert_eq!(h.repo.list_favourite_cards().await.unwrap().len(), 0);
}

#[tokio::test]
async fn upsert_many_replaces_by_card_id() {
    let h = harness(base_set_catalogue());
    let a = h.repo.add_card_to_collection("base1-1").await.unwrap();

    let mut renamed = a.clone();
    renamed.name = "Bulbasaur (1st edition)".into();
    let fresh = OwnedCard::new("base1-2", "Ivysaur");

    let stored = h.repo.upsert_owned_cards(&[renamed, fresh]).await.unwrap();
    assert_eq!(stored[0].local_id, a.local_id);
    assert_eq!(h.local.list_owned_cards().await.unwrap().len(), 2);
    let doc = h.remote.get_document(USER, "base1-1").await.unwrap().unwrap();
    assert_eq!(doc.name, "Bulbasaur (1st edition)");
}

#[tokio::test]
async fn upsert_without_card_id_is_invalid() {
    let h = harness(base_set_catalogue());
    let err = h.repo.upsert_owned_card(&OwnedCard::new("", "nameless")).await.unwrap_err();
    assert!(matches!(err, CoreError::Invalid(_)));
    assert!(h.remote.local_before_remote.lock().is_empty());
}

#[tokio::test]
async fn delete_removes_local_and_remote_copies() {
    let h = harness(base_set_catalogue());
    let mut stream = h.repo.get_owned_cards_stream();
    assert!(next_snapshot(&mut stream).await.is_empty());

    let kept = h.repo.add_card_to_collection("base1-1").await.unwrap();
    let gone = h.repo.add_card_to_collection("base1-2").await.unwrap();
    let snapshot = next_snapshot(&mut stream).await;
    assert_eq!(snapshot.len(), 2);

    h.repo.delete_owned_card(&gone).await.unwrap();
    let snapshot = next_snapshot(&mut stream).await;
    assert_eq!(snapshot, vec![kept]);
    assert!(h.remote.get_document(USER, "base1-2").await.unwrap().is_none());
}

#[tokio::test]
async fn retried_delete_reaches_remote_after_remote_failure() {
    let h = harness(base_set_catalogue());
    let card = h.repo.add_card_to_collection("base1-1").await.unwrap();

    h.remote.set_failing(true);
    let err = h.repo.delete_owned_card(&card).await.unwrap_err();
    assert!(matches!(err, CoreError::Transport(_)));
    assert!(h.local.get_owned_card("base1-1").await.unwrap().is_none());
    assert!(h.remote.get_document(USER, "base1-1").await.unwrap().is_some());

    h.remote.set_failing(false);
    h.repo.delete_owned_card(&card).await.unwrap();
    assert!(h.remote.get_document(USER, "base1-1").await.unwrap().is_none());
}

#[tokio::test]
async fn late_subscriber_sees_latest_snapshot() {
    let h = harness(base_set_catalogue());
    h.repo.add_card_to_collection("base1-4").await.unwrap();

    let mut stream = h.repo.get_owned_cards_stream();
    let snapshot = next_snapshot(&mut stream).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].card_id, "base1-4");
    assert_eq!(stream.latest(), snapshot);
}

#[tokio::test]
async fn reconcile_pushes_local_and_prunes_remote() {
    let h = harness(base_set_catalogue());
    h.repo.add_card_to_collection("base1-1").await.unwrap();

    // remote write lost for this one
    h.remote.set_failing(true);
    assert!(h.repo.add_card_to_collection("base1-2").await.is_err());
    h.remote.set_failing(false);

    // stale remote-only document
    h.remote
        .set_document(USER, &OwnedCard::new("jungle-1", "Clefable"))
        .await
        .unwrap();

    let report = h.repo.reconcile_collection().await.unwrap();
    assert_eq!(report, ReconcileReport { pushed: 2, removed: 1 });

    let mut remote: Vec<String> = h
        .remote
        .list_documents(USER)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.card_id)
        .collect();
    remote.sort();
    assert_eq!(remote, vec!["base1-1", "base1-2"]);
}

#[tokio::test]
async fn sets_and_series_are_read_through() {
    let set = RemoteSet {
        id: "base1".into(),
        name: Some("Base Set".into()),
        logo: Some("https://assets.example/base1/logo".into()),
        serie: Some(RemoteRef {
            id: "base".into(),
            ..Default::default()
        }),
        ..Default::default()
    };
    let series = RemoteSeries {
        id: "base".into(),
        name: Some("Base".into()),
        ..Default::default()
    };
    let h = harness(base_set_catalogue().with_set(set).with_series(series));

    let loaded = h.repo.load_catalogue_set("base1").await.unwrap();
    assert_eq!(loaded.series_id, "base");
    assert_eq!(loaded.logo, "https://assets.example/base1/logo.png");
    h.repo.load_catalogue_set("base1").await.unwrap();
    assert_eq!(h.catalogue.set_calls(), 1);

    let s = h.repo.load_catalogue_series("base").await.unwrap();
    assert_eq!(s.name, "Base");
    h.repo.load_catalogue_series("base").await.unwrap();
    assert_eq!(h.catalogue.series_calls(), 1);

    assert!(matches!(
        h.repo.load_catalogue_set("gym1").await,
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(
        h.repo.load_catalogue_series("neo").await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn stats_group_by_set() {
    let h = harness(base_set_catalogue());
    let ids = vec!["base1-1".to_string(), "base1-2".to_string(), "jungle-1".to_string()];
    let stored = h.repo.add_cards_to_collection(&ids).await.unwrap();
    h.repo.toggle_favourite(&stored[2]).await.unwrap();

    let stats = h.repo.collection_stats().await.unwrap();
    assert_eq!(stats.totals.total, 3);
    assert_eq!(stats.totals.favourites, 1);
    assert_eq!(stats.per_set["base1"].total, 2);
    assert_eq!(stats.per_set["jungle"].favourites, 1);
    assert_eq!(stats.largest_set(), Some(("base1", 2)));
}
