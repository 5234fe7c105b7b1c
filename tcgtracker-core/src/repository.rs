use crate::{
    filters, stats, CatalogueCardDetail, CatalogueCardSummary, CatalogueClient, CatalogueSeries,
    CatalogueSeriesSummary, CatalogueSet, CatalogueSetSummary, CollectionStats, CollectionStore,
    CoreError, LocalStore, OwnedCard, OwnedCardsStream, SummaryCache, WriteBatch,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub pushed: usize,
    pub removed: usize,
}

pub struct CardRepository {
    catalogue: Arc<dyn CatalogueClient>,
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn CollectionStore>,
    user_id: String,
    summaries: SummaryCache,
}

impl CardRepository {
    pub fn new(
        catalogue: Arc<dyn CatalogueClient>,
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn CollectionStore>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            catalogue,
            local,
            remote,
            user_id: user_id.into(),
            summaries: SummaryCache::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    // ===== Catalogue reads =====

    pub async fn load_catalogue_card_detail(&self, id: &str) -> Result<CatalogueCardDetail, CoreError> {
        if id.trim().is_empty() {
            return Err(CoreError::Invalid("blank catalogue card id"));
        }
        if let Some(card) = self.local.get_catalogue_card(id).await? {
            log::debug!("catalogue card cache hit for {}", id);
            return Ok(card);
        }

        log::debug!("catalogue card cache miss for {}, fetching", id);
        let remote = self
            .catalogue
            .fetch_card_by_id(id)
            .await?
            .filter(|r| !r.id.trim().is_empty())
            .ok_or_else(|| CoreError::not_found("catalogue card", id))?;

        let card = CatalogueCardDetail::from(remote);
        self.local.put_catalogue_card(&card).await?;
        Ok(card)
    }

    /// Warms the in-memory summary list once per cache generation.
    pub async fn load_catalogue_summaries(&self) -> Result<Vec<CatalogueCardSummary>, CoreError> {
        if !self.summaries.is_empty() {
            return Ok(self.summaries.snapshot());
        }
        let cards = self.catalogue.fetch_all_cards().await?;
        log::info!("loaded {} catalogue summaries", cards.len());
        self.summaries.fill(cards.clone());
        Ok(cards)
    }

    pub fn invalidate_summaries(&self) {
        self.summaries.invalidate();
    }

    /// Drops a cached card detail so the next load fetches it again.
    pub async fn invalidate_catalogue_card(&self, id: &str) -> Result<bool, CoreError> {
        self.local.delete_catalogue_card(id).await
    }

    /// Matches whose detail fetch fails or comes back empty are dropped.
    pub async fn search_catalogues_by_name(&self, query: &str) -> Result<Vec<CatalogueCardDetail>, CoreError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.load_catalogue_summaries().await?;

        let matches = self.summaries.matching_name(query);
        let mut out = Vec::with_capacity(matches.len());
        for summary in matches {
            let fetched = self.catalogue.fetch_card_by_id(&summary.id).await;
            match fetched.map(|found| found.filter(|r| !r.id.trim().is_empty())) {
                Ok(Some(remote)) => out.push(CatalogueCardDetail::from(remote)),
                Ok(None) => log::warn!("search: catalogue has no detail for {}", summary.id),
                Err(e) => log::warn!("search: dropping {}: {}", summary.id, e),
            }
        }
        Ok(out)
    }

    pub async fn load_catalogue_set(&self, id: &str) -> Result<CatalogueSet, CoreError> {
        if let Some(set) = self.local.get_catalogue_set(id).await? {
            log::debug!("catalogue set cache hit for {}", id);
            return Ok(set);
        }
        let remote = self
            .catalogue
            .fetch_set_by_id(id)
            .await?
            .filter(|r| !r.id.trim().is_empty())
            .ok_or_else(|| CoreError::not_found("catalogue set", id))?;
        let set = CatalogueSet::from(remote);
        self.local.put_catalogue_set(&set).await?;
        Ok(set)
    }

    pub async fn load_catalogue_series(&self, id: &str) -> Result<CatalogueSeries, CoreError> {
        if let Some(series) = self.local.get_catalogue_series(id).await? {
            log::debug!("catalogue series cache hit for {}", id);
            return Ok(series);
        }
        let remote = self
            .catalogue
            .fetch_series_by_id(id)
            .await?
            .filter(|r| !r.id.trim().is_empty())
            .ok_or_else(|| CoreError::not_found("catalogue series", id))?;
        let series = CatalogueSeries::from(remote);
        self.local.put_catalogue_series(&series).await?;
        Ok(series)
    }

    pub async fn fetch_all_sets(&self) -> Result<Vec<CatalogueSetSummary>, CoreError> {
        self.catalogue.fetch_all_sets().await
    }

    pub async fn fetch_all_series(&self) -> Result<Vec<CatalogueSeriesSummary>, CoreError> {
        self.catalogue.fetch_all_series().await
    }

    // ===== Collection reads =====

    pub async fn get_owned_card(&self, card_id: &str) -> Result<Option<OwnedCard>, CoreError> {
        self.local.get_owned_card(card_id).await
    }

    pub async fn list_owned_cards(&self) -> Result<Vec<OwnedCard>, CoreError> {
        self.local.list_owned_cards().await
    }

    pub async fn list_favourite_cards(&self) -> Result<Vec<OwnedCard>, CoreError> {
        let cards = self.local.list_owned_cards().await?;
        Ok(filters::filter_favourites(&cards))
    }

    pub async fn collection_stats(&self) -> Result<CollectionStats, CoreError> {
        let cards = self.local.list_owned_cards().await?;
        Ok(stats::summarize(&cards))
    }

    pub fn get_owned_cards_stream(&self) -> OwnedCardsStream {
        self.local.watch_owned_cards()
    }

    // ===== Collection writes =====

    pub async fn add_card_to_collection(&self, card_id: &str) -> Result<OwnedCard, CoreError> {
        let detail = self.load_catalogue_card_detail(card_id).await?;
        let stored = self.local.upsert_owned_card(&OwnedCard::from_detail(&detail)).await?;

        log::info!("syncing {} to remote collection of {}", stored.card_id, self.user_id);
        self.remote.set_document(&self.user_id, &stored).await?;
        Ok(stored)
    }

    /// Every id is resolved before anything is written; one unresolvable id
    /// aborts the whole batch with the local store untouched.
    pub async fn add_cards_to_collection(&self, card_ids: &[String]) -> Result<Vec<OwnedCard>, CoreError> {
        if card_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut cards = Vec::with_capacity(card_ids.len());
        for id in card_ids {
            let detail = self.load_catalogue_card_detail(id).await?;
            cards.push(OwnedCard::from_detail(&detail));
        }

        let stored = self.local.upsert_owned_cards(&cards).await?;
        self.commit_remote_sets(&stored).await?;
        Ok(stored)
    }

    pub async fn upsert_owned_card(&self, card: &OwnedCard) -> Result<OwnedCard, CoreError> {
        let stored = self.local.upsert_owned_card(card).await?;
        log::info!("syncing {} to remote collection of {}", stored.card_id, self.user_id);
        self.remote.set_document(&self.user_id, &stored).await?;
        Ok(stored)
    }

    pub async fn upsert_owned_cards(&self, cards: &[OwnedCard]) -> Result<Vec<OwnedCard>, CoreError> {
        if cards.is_empty() {
            return Ok(Vec::new());
        }
        let stored = self.local.upsert_owned_cards(cards).await?;
        self.commit_remote_sets(&stored).await?;
        Ok(stored)
    }

    pub async fn toggle_favourite(&self, card: &OwnedCard) -> Result<OwnedCard, CoreError> {
        self.upsert_owned_card(&card.with_favourite_toggled()).await
    }

    pub async fn delete_owned_card(&self, card: &OwnedCard) -> Result<(), CoreError> {
        self.local.delete_owned_card(card.local_id).await?;
        log::info!("removing {} from remote collection of {}", card.card_id, self.user_id);
        self.remote.delete_document(&self.user_id, &card.card_id).await
    }

    /// Makes the remote collection match the local one: every local record
    /// is re-set and remote-only documents are deleted, in one batch.
    pub async fn reconcile_collection(&self) -> Result<ReconcileReport, CoreError> {
        let local = self.local.list_owned_cards().await?;
        let remote = self.remote.list_documents(&self.user_id).await?;

        let local_ids: HashSet<&str> = local.iter().map(|c| c.card_id.as_str()).collect();
        let mut batch = WriteBatch::new();
        for card in &local {
            batch.set(card.clone());
        }
        let mut removed = 0;
        for doc in remote.iter().filter(|d| !local_ids.contains(d.card_id.as_str())) {
            batch.delete(doc.card_id.clone());
            removed += 1;
        }

        if !batch.is_empty() {
            self.remote.commit_batch(&self.user_id, &batch).await?;
        }
        log::info!(
            "reconciled collection of {}: {} pushed, {} removed",
            self.user_id,
            local.len(),
            removed
        );
        Ok(ReconcileReport {
            pushed: local.len(),
            removed,
        })
    }

    async fn commit_remote_sets(&self, cards: &[OwnedCard]) -> Result<(), CoreError> {
        let mut batch = WriteBatch::new();
        for card in cards {
            batch.set(card.clone());
        }
        log::info!(
            "committing batch of {} to remote collection of {}",
            batch.len(),
            self.user_id
        );
        self.remote.commit_batch(&self.user_id, &batch).await
    }
}
