use crate::{build_client, check_status, transport, trim_base};
use async_trait::async_trait;
use tcgtracker_core::{CollectionStore, CoreError, OwnedCard, WriteBatch};

// The server applies `collection:commit` batches all-or-nothing.
pub struct RestCollectionStore {
    http: reqwest::Client,
    base_url: String,
}

impl RestCollectionStore {
    pub fn new(base_url: &str) -> Result<Self, CoreError> {
        Ok(Self {
            http: build_client()?,
            base_url: trim_base(base_url),
        })
    }

    fn collection_url(&self, user_id: &str) -> String {
        format!("{}/users/{}/collection", self.base_url, urlencoding::encode(user_id))
    }

    fn document_url(&self, user_id: &str, card_id: &str) -> String {
        format!("{}/{}", self.collection_url(user_id), urlencoding::encode(card_id))
    }
}

#[async_trait]
impl CollectionStore for RestCollectionStore {
    async fn set_document(&self, user_id: &str, card: &OwnedCard) -> Result<(), CoreError> {
        card.validate()?;
        let url = self.document_url(user_id, &card.card_id);
        log::debug!("PUT {}", url);
        let response = self.http.put(&url).json(card).send().await.map_err(transport)?;
        // a 404 on write means the namespace itself is missing
        check_status(&url, response)?.ok_or_else(|| CoreError::not_found("collection of", user_id))?;
        Ok(())
    }

    async fn get_document(&self, user_id: &str, card_id: &str) -> Result<Option<OwnedCard>, CoreError> {
        let url = self.document_url(user_id, card_id);
        log::debug!("GET {}", url);
        let response = self.http.get(&url).send().await.map_err(transport)?;
        match check_status(&url, response)? {
            Some(ok) => Ok(Some(ok.json::<OwnedCard>().await.map_err(transport)?)),
            None => Ok(None),
        }
    }

    async fn list_documents(&self, user_id: &str) -> Result<Vec<OwnedCard>, CoreError> {
        let url = self.collection_url(user_id);
        log::debug!("GET {}", url);
        let response = self.http.get(&url).send().await.map_err(transport)?;
        match check_status(&url, response)? {
            Some(ok) => ok.json::<Vec<OwnedCard>>().await.map_err(transport),
            None => Ok(Vec::new()),
        }
    }

    async fn delete_document(&self, user_id: &str, card_id: &str) -> Result<(), CoreError> {
        let url = self.document_url(user_id, card_id);
        log::debug!("DELETE {}", url);
        let response = self.http.delete(&url).send().await.map_err(transport)?;
        check_status(&url, response)?;
        Ok(())
    }

    async fn commit_batch(&self, user_id: &str, batch: &WriteBatch) -> Result<(), CoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let url = format!("{}:commit", self.collection_url(user_id));
        log::debug!("POST {} ({} writes)", url, batch.len());
        let response = self.http.post(&url).json(batch).send().await.map_err(transport)?;
        check_status(&url, response)?.ok_or_else(|| CoreError::not_found("collection of", user_id))?;
        Ok(())
    }
}
