use crate::{build_client, check_status, transport, trim_base};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tcgtracker_core::{
    CatalogueCardSummary, CatalogueClient, CatalogueSeriesSummary, CatalogueSetSummary, CoreError,
    RemoteCard, RemoteSeries, RemoteSet,
};

pub const DEFAULT_BASE_URL: &str = "https://api.tcgdex.net/v2";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Client for the TCGdex v2 REST API.
pub struct TcgdexClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl TcgdexClient {
    pub fn new(base_url: &str, language: &str) -> Result<Self, CoreError> {
        Ok(Self {
            http: build_client()?,
            base_url: trim_base(base_url),
            language: language.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.language, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, CoreError> {
        let url = self.url(path);
        log::debug!("GET {}", url);
        let response = self.http.get(&url).send().await.map_err(transport)?;
        match check_status(&url, response)? {
            Some(ok) => Ok(Some(ok.json::<T>().await.map_err(transport)?)),
            None => Ok(None),
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, CoreError> {
        Ok(self.get_json::<Vec<T>>(path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl CatalogueClient for TcgdexClient {
    async fn fetch_card_by_id(&self, id: &str) -> Result<Option<RemoteCard>, CoreError> {
        self.get_json(&format!("cards/{}", urlencoding::encode(id))).await
    }

    async fn fetch_all_cards(&self) -> Result<Vec<CatalogueCardSummary>, CoreError> {
        self.get_list("cards").await
    }

    async fn fetch_set_by_id(&self, id: &str) -> Result<Option<RemoteSet>, CoreError> {
        self.get_json(&format!("sets/{}", urlencoding::encode(id))).await
    }

    async fn fetch_all_sets(&self) -> Result<Vec<CatalogueSetSummary>, CoreError> {
        self.get_list("sets").await
    }

    async fn fetch_series_by_id(&self, id: &str) -> Result<Option<RemoteSeries>, CoreError> {
        self.get_json(&format!("series/{}", urlencoding::encode(id))).await
    }

    async fn fetch_all_series(&self) -> Result<Vec<CatalogueSeriesSummary>, CoreError> {
        self.get_list("series").await
    }
}
