use crate::repo::table::OwnedTable;
use crate::{
    BatchWrite, CatalogueCardDetail, CatalogueSeries, CatalogueSet, CoreError, LocalId, OwnedCard,
    OwnedCardsFeed, OwnedCardsStream, WriteBatch,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Process-local [`crate::LocalStore`]; contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    cards: RwLock<HashMap<String, CatalogueCardDetail>>,
    sets: RwLock<HashMap<String, CatalogueSet>>,
    series: RwLock<HashMap<String, CatalogueSeries>>,
    owned: RwLock<OwnedTable>,
    feed: OwnedCardsFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn publish(&self, owned: &OwnedTable) {
        self.feed.publish(owned.snapshot());
    }
}

#[async_trait]
impl crate::repo::LocalStore for MemoryStore {
    async fn get_catalogue_card(&self, id: &str) -> Result<Option<CatalogueCardDetail>, CoreError> {
        Ok(self.cards.read().get(id).cloned())
    }

    async fn put_catalogue_card(&self, card: &CatalogueCardDetail) -> Result<(), CoreError> {
        self.cards.write().insert(card.id.clone(), card.clone());
        Ok(())
    }

    async fn delete_catalogue_card(&self, id: &str) -> Result<bool, CoreError> {
        Ok(self.cards.write().remove(id).is_some())
    }

    async fn list_catalogue_cards(&self) -> Result<Vec<CatalogueCardDetail>, CoreError> {
        let mut v: Vec<CatalogueCardDetail> = self.cards.read().values().cloned().collect();
        v.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(v)
    }

    async fn get_catalogue_set(&self, id: &str) -> Result<Option<CatalogueSet>, CoreError> {
        Ok(self.sets.read().get(id).cloned())
    }

    async fn put_catalogue_set(&self, set: &CatalogueSet) -> Result<(), CoreError> {
        self.sets.write().insert(set.id.clone(), set.clone());
        Ok(())
    }

    async fn get_catalogue_series(&self, id: &str) -> Result<Option<CatalogueSeries>, CoreError> {
        Ok(self.series.read().get(id).cloned())
    }

    async fn put_catalogue_series(&self, series: &CatalogueSeries) -> Result<(), CoreError> {
        self.series.write().insert(series.id.clone(), series.clone());
        Ok(())
    }

    async fn get_owned_card(&self, card_id: &str) -> Result<Option<OwnedCard>, CoreError> {
        Ok(self.owned.read().get_by_card_id(card_id).cloned())
    }

    async fn list_owned_cards(&self) -> Result<Vec<OwnedCard>, CoreError> {
        Ok(self.owned.read().snapshot())
    }

    async fn upsert_owned_card(&self, card: &OwnedCard) -> Result<OwnedCard, CoreError> {
        let mut owned = self.owned.write();
        let stored = owned.upsert(card)?;
        self.publish(&owned);
        Ok(stored)
    }

    async fn upsert_owned_cards(&self, cards: &[OwnedCard]) -> Result<Vec<OwnedCard>, CoreError> {
        let mut owned = self.owned.write();
        let stored = owned.upsert_all(cards)?;
        self.publish(&owned);
        Ok(stored)
    }

    async fn delete_owned_card(&self, local_id: LocalId) -> Result<(), CoreError> {
        let mut owned = self.owned.write();
        if owned.delete(local_id).is_some() {
            self.publish(&owned);
        }
        Ok(())
    }

    fn watch_owned_cards(&self) -> OwnedCardsStream {
        self.feed.subscribe()
    }
}

#[derive(Default)]
pub struct MemoryCollectionStore {
    users: RwLock<HashMap<String, BTreeMap<String, OwnedCard>>>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl crate::repo::CollectionStore for MemoryCollectionStore {
    async fn set_document(&self, user_id: &str, card: &OwnedCard) -> Result<(), CoreError> {
        card.validate()?;
        self.users
            .write()
            .entry(user_id.to_string())
            .or_default()
            .insert(card.card_id.clone(), card.clone());
        Ok(())
    }

    async fn get_document(&self, user_id: &str, card_id: &str) -> Result<Option<OwnedCard>, CoreError> {
        Ok(self
            .users
            .read()
            .get(user_id)
            .and_then(|docs| docs.get(card_id))
            .cloned())
    }

    async fn list_documents(&self, user_id: &str) -> Result<Vec<OwnedCard>, CoreError> {
        Ok(self
            .users
            .read()
            .get(user_id)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_document(&self, user_id: &str, card_id: &str) -> Result<(), CoreError> {
        if let Some(docs) = self.users.write().get_mut(user_id) {
            docs.remove(card_id);
        }
        Ok(())
    }

    async fn commit_batch(&self, user_id: &str, batch: &WriteBatch) -> Result<(), CoreError> {
        for write in &batch.writes {
            if let BatchWrite::Set { card } = write {
                card.validate()?;
            }
        }
        let mut users = self.users.write();
        let docs = users.entry(user_id.to_string()).or_default();
        for write in &batch.writes {
            match write {
                BatchWrite::Set { card } => {
                    docs.insert(card.card_id.clone(), card.clone());
                }
                BatchWrite::Delete { card_id } => {
                    docs.remove(card_id);
                }
            }
        }
        Ok(())
    }
}
