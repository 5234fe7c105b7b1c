use crate::{
    CardCount, CatalogueCardDetail, CatalogueCardSummary, CatalogueSeries,
    CatalogueSeriesSummary, CatalogueSet, CatalogueSetSummary, CoreError,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteCard {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    /// Asset base; the concrete image lives under `{image}/high.png`.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub set: Option<RemoteRef>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSet {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub card_count: Option<CardCount>,
    #[serde(default)]
    pub serie: Option<RemoteRef>,
    #[serde(default)]
    pub cards: Vec<CatalogueCardSummary>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteSeries {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub sets: Vec<CatalogueSetSummary>,
}

pub fn image_url(base: &str) -> String {
    format!("{base}/high.png")
}

pub fn logo_url(base: &str) -> String {
    format!("{base}.png")
}

impl From<RemoteCard> for CatalogueCardDetail {
    fn from(remote: RemoteCard) -> Self {
        let set = remote.set.unwrap_or_default();
        Self {
            id: remote.id,
            name: remote.name.unwrap_or_default(),
            rarity: remote.rarity.unwrap_or_default(),
            category: remote.category.unwrap_or_default(),
            types: remote.types.unwrap_or_default(),
            set_id: set.id,
            set_name: set.name.unwrap_or_default(),
            set_logo: set.logo.as_deref().map(logo_url).unwrap_or_default(),
            description: remote.description.unwrap_or_default(),
            image_url: remote.image.as_deref().map(image_url).unwrap_or_default(),
            favourite: false,
        }
    }
}

impl From<RemoteSet> for CatalogueSet {
    fn from(remote: RemoteSet) -> Self {
        Self {
            id: remote.id,
            name: remote.name.unwrap_or_default(),
            series_id: remote.serie.map(|s| s.id).unwrap_or_default(),
            logo: remote.logo.as_deref().map(logo_url).unwrap_or_default(),
            release_date: remote.release_date.unwrap_or_default(),
            card_count: remote.card_count.unwrap_or_default(),
            cards: remote.cards,
        }
    }
}

impl From<RemoteSeries> for CatalogueSeries {
    fn from(remote: RemoteSeries) -> Self {
        Self {
            id: remote.id,
            name: remote.name.unwrap_or_default(),
            logo: remote.logo.as_deref().map(logo_url).unwrap_or_default(),
            sets: remote.sets,
        }
    }
}

/// Lookups answer `Ok(None)` for unknown ids.
#[async_trait]
pub trait CatalogueClient: Send + Sync {
    async fn fetch_card_by_id(&self, id: &str) -> Result<Option<RemoteCard>, CoreError>;
    async fn fetch_all_cards(&self) -> Result<Vec<CatalogueCardSummary>, CoreError>;

    async fn fetch_set_by_id(&self, id: &str) -> Result<Option<RemoteSet>, CoreError>;
    async fn fetch_all_sets(&self) -> Result<Vec<CatalogueSetSummary>, CoreError>;

    async fn fetch_series_by_id(&self, id: &str) -> Result<Option<RemoteSeries>, CoreError>;
    async fn fetch_all_series(&self) -> Result<Vec<CatalogueSeriesSummary>, CoreError>;
}
