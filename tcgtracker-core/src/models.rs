use serde::{Deserialize, Serialize};

/// Store-assigned primary key of an owned card. `0` means "not yet stored".
pub type LocalId = i64;

pub const UNSAVED_LOCAL_ID: LocalId = 0;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardCount {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub official: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueSetSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub card_count: Option<CardCount>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogueSeriesSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueCardSummary {
    pub id: String,
    #[serde(default)]
    pub local_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub set: Option<CatalogueSetSummary>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogueCardDetail {
    pub id: String,
    pub name: String,
    pub rarity: String,
    pub category: String,
    pub types: Vec<String>,
    pub set_id: String,
    pub set_name: String,
    pub set_logo: String,
    pub description: String,
    pub image_url: String,
    pub favourite: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogueSet {
    pub id: String,
    pub name: String,
    pub series_id: String,
    pub logo: String,
    pub release_date: String,
    pub card_count: CardCount,
    pub cards: Vec<CatalogueCardSummary>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogueSeries {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub sets: Vec<CatalogueSetSummary>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnedCard {
    #[serde(default)]
    pub local_id: LocalId,
    pub card_id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub favourite: bool,
    #[serde(default)]
    pub owned: bool,
}

impl OwnedCard {
    pub fn new(card_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            local_id: UNSAVED_LOCAL_ID,
            card_id: card_id.into(),
            name: name.into(),
            image_url: None,
            favourite: false,
            owned: true,
        }
    }

    pub fn from_detail(detail: &CatalogueCardDetail) -> Self {
        let mut card = Self::new(detail.id.clone(), detail.name.clone());
        if !detail.image_url.is_empty() {
            card.image_url = Some(detail.image_url.clone());
        }
        card
    }

    pub fn is_unsaved(&self) -> bool {
        self.local_id == UNSAVED_LOCAL_ID
    }

    pub fn with_favourite_toggled(&self) -> Self {
        Self {
            favourite: !self.favourite,
            ..self.clone()
        }
    }

    /// Catalogue card ids are `<set>-<number>`, e.g. `base1-4`.
    pub fn set_id(&self) -> &str {
        self.card_id
            .rsplit_once('-')
            .map(|(set, _)| set)
            .unwrap_or(&self.card_id)
    }

    pub fn validate(&self) -> Result<(), crate::CoreError> {
        if self.card_id.trim().is_empty() {
            return Err(crate::CoreError::Invalid("owned card without card id"));
        }
        Ok(())
    }
}
