use crate::{
    CatalogueCardDetail, CatalogueSeries, CatalogueSet, CoreError, LocalId, OwnedCard,
    OwnedCardsStream,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod table;

pub use memory::{MemoryCollectionStore, MemoryStore};
pub use table::OwnedTable;

/// On-device storage: read-through cache tables for catalogue records plus
/// the user's owned cards.
#[async_trait]
pub trait LocalStore: Send + Sync {
    // Catalogue cards
    async fn get_catalogue_card(&self, id: &str) -> Result<Option<CatalogueCardDetail>, CoreError>;
    async fn put_catalogue_card(&self, card: &CatalogueCardDetail) -> Result<(), CoreError>;
    async fn delete_catalogue_card(&self, id: &str) -> Result<bool, CoreError>;
    async fn list_catalogue_cards(&self) -> Result<Vec<CatalogueCardDetail>, CoreError>;

    // Sets / series
    async fn get_catalogue_set(&self, id: &str) -> Result<Option<CatalogueSet>, CoreError>;
    async fn put_catalogue_set(&self, set: &CatalogueSet) -> Result<(), CoreError>;
    async fn get_catalogue_series(&self, id: &str) -> Result<Option<CatalogueSeries>, CoreError>;
    async fn put_catalogue_series(&self, series: &CatalogueSeries) -> Result<(), CoreError>;

    // Owned cards
    async fn get_owned_card(&self, card_id: &str) -> Result<Option<OwnedCard>, CoreError>;
    async fn list_owned_cards(&self) -> Result<Vec<OwnedCard>, CoreError>;
    /// Insert-or-replace keyed by `card_id`; an existing row keeps its
    /// `local_id`. Returns the stored record.
    async fn upsert_owned_card(&self, card: &OwnedCard) -> Result<OwnedCard, CoreError>;
    async fn upsert_owned_cards(&self, cards: &[OwnedCard]) -> Result<Vec<OwnedCard>, CoreError>;
    /// Succeeds when no row has `local_id`.
    async fn delete_owned_card(&self, local_id: LocalId) -> Result<(), CoreError>;

    fn watch_owned_cards(&self) -> OwnedCardsStream;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BatchWrite {
    Set { card: OwnedCard },
    Delete { card_id: String },
}

/// Writes applied together by [`CollectionStore::commit_batch`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteBatch {
    pub writes: Vec<BatchWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, card: OwnedCard) -> &mut Self {
        self.writes.push(BatchWrite::Set { card });
        self
    }

    pub fn delete(&mut self, card_id: impl Into<String>) -> &mut Self {
        self.writes.push(BatchWrite::Delete {
            card_id: card_id.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Remote per-user document store holding the mirrored collection.
/// Documents live at `users/{user_id}/collection/{card_id}`.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn set_document(&self, user_id: &str, card: &OwnedCard) -> Result<(), CoreError>;
    async fn get_document(&self, user_id: &str, card_id: &str) -> Result<Option<OwnedCard>, CoreError>;
    async fn list_documents(&self, user_id: &str) -> Result<Vec<OwnedCard>, CoreError>;
    /// Deleting an absent document succeeds.
    async fn delete_document(&self, user_id: &str, card_id: &str) -> Result<(), CoreError>;
    /// Applies every write or none of them.
    async fn commit_batch(&self, user_id: &str, batch: &WriteBatch) -> Result<(), CoreError>;
}
