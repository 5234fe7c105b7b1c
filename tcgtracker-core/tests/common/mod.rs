#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tcgtracker_core::*;

/// Catalogue double that counts every call.
#[derive(Default)]
pub struct FakeCatalogue {
    cards: HashMap<String, RemoteCard>,
    summaries: Vec<CatalogueCardSummary>,
    sets: HashMap<String, RemoteSet>,
    series: HashMap<String, RemoteSeries>,
    failing: HashSet<String>,
    detail_calls: AtomicUsize,
    list_calls: AtomicUsize,
    set_calls: AtomicUsize,
    series_calls: AtomicUsize,
}

impl FakeCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_card(mut self, id: &str, name: &str, rarity: &str) -> Self {
        self.cards.insert(
            id.to_string(),
            RemoteCard {
                id: id.to_string(),
                name: Some(name.to_string()),
                rarity: Some(rarity.to_string()),
                ..Default::default()
            },
        );
        self.summaries.push(CatalogueCardSummary {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        });
        self
    }

    /// Listed in the summary list, but every detail fetch fails.
    pub fn with_failing_card(mut self, id: &str, name: &str) -> Self {
        self.failing.insert(id.to_string());
        self.summaries.push(CatalogueCardSummary {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        });
        self
    }

    /// Listed in the summary list, but the detail comes back with no id.
    pub fn with_blank_card(mut self, id: &str, name: &str) -> Self {
        self.cards.insert(id.to_string(), RemoteCard::default());
        self.summaries.push(CatalogueCardSummary {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        });
        self
    }

    pub fn with_set(mut self, set: RemoteSet) -> Self {
        self.sets.insert(set.id.clone(), set);
        self
    }

    pub fn with_series(mut self, series: RemoteSeries) -> Self {
        self.series.insert(series.id.clone(), series);
        self
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogueClient for FakeCatalogue {
    async fn fetch_card_by_id(&self, id: &str) -> Result<Option<RemoteCard>, CoreError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(id) {
            return Err(CoreError::Transport(format!("timeout fetching {id}")));
        }
        Ok(self.cards.get(id).cloned())
    }

    async fn fetch_all_cards(&self) -> Result<Vec<CatalogueCardSummary>, CoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.summaries.clone())
    }

    async fn fetch_set_by_id(&self, id: &str) -> Result<Option<RemoteSet>, CoreError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sets.get(id).cloned())
    }

    async fn fetch_all_sets(&self) -> Result<Vec<CatalogueSetSummary>, CoreError> {
        Ok(self
            .sets
            .values()
            .map(|s| CatalogueSetSummary {
                id: s.id.clone(),
                name: s.name.clone().unwrap_or_default(),
                ..Default::default()
            })
            .collect())
    }

    async fn fetch_series_by_id(&self, id: &str) -> Result<Option<RemoteSeries>, CoreError> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.series.get(id).cloned())
    }

    async fn fetch_all_series(&self) -> Result<Vec<CatalogueSeriesSummary>, CoreError> {
        Ok(Vec::new())
    }
}

/// Collection store double: records whether the local store already held a
/// card when its remote write arrived, and can be switched to fail.
pub struct RecordingCollectionStore {
    inner: MemoryCollectionStore,
    local: Arc<MemoryStore>,
    fail: AtomicBool,
    pub local_before_remote: Mutex<Vec<bool>>,
}

impl RecordingCollectionStore {
    pub fn new(local: Arc<MemoryStore>) -> Self {
        Self {
            inner: MemoryCollectionStore::new(),
            local,
            fail: AtomicBool::new(false),
            local_before_remote: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(CoreError::Transport("remote unavailable".into()))
        } else {
            Ok(())
        }
    }

    async fn record(&self, card_id: &str) -> Result<(), CoreError> {
        let present = self.local.get_owned_card(card_id).await?.is_some();
        self.local_before_remote.lock().push(present);
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for RecordingCollectionStore {
    async fn set_document(&self, user_id: &str, card: &OwnedCard) -> Result<(), CoreError> {
        self.record(&card.card_id).await?;
        self.check()?;
        self.inner.set_document(user_id, card).await
    }

    async fn get_document(&self, user_id: &str, card_id: &str) -> Result<Option<OwnedCard>, CoreError> {
        self.inner.get_document(user_id, card_id).await
    }

    async fn list_documents(&self, user_id: &str) -> Result<Vec<OwnedCard>, CoreError> {
        self.inner.list_documents(user_id).await
    }

    async fn delete_document(&self, user_id: &str, card_id: &str) -> Result<(), CoreError> {
        self.check()?;
        self.inner.delete_document(user_id, card_id).await
    }

    async fn commit_batch(&self, user_id: &str, batch: &WriteBatch) -> Result<(), CoreError> {
        for write in &batch.writes {
            if let BatchWrite::Set { card } = write {
                self.record(&card.card_id).await?;
            }
        }
        self.check()?;
        self.inner.commit_batch(user_id, batch).await
    }
}

pub const USER: &str = "user-1";

pub struct Harness {
    pub repo: CardRepository,
    pub catalogue: Arc<FakeCatalogue>,
    pub local: Arc<MemoryStore>,
    pub remote: Arc<RecordingCollectionStore>,
}

pub fn harness(catalogue: FakeCatalogue) -> Harness {
    let catalogue = Arc::new(catalogue);
    let local = Arc::new(MemoryStore::new());
    let remote = Arc::new(RecordingCollectionStore::new(local.clone()));
    let repo = CardRepository::new(catalogue.clone(), local.clone(), remote.clone(), USER);
    Harness {
        repo,
        catalogue,
        local,
        remote,
    }
}

pub fn base_set_catalogue() -> FakeCatalogue {
    FakeCatalogue::new()
        .with_card("base1-1", "Bulbasaur", "Common")
        .with_card("base1-2", "Ivysaur", "Uncommon")
        .with_card("base1-4", "Charmander", "Common")
        .with_card("jungle-1", "Clefable", "Rare")
}
