use crate::{CoreError, LocalId, OwnedCard, UNSAVED_LOCAL_ID};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owned-card rows keyed by local id with `card_id` as the logical key.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OwnedTable {
    last_id: LocalId,
    rows: BTreeMap<LocalId, OwnedCard>,
}

impl OwnedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = OwnedCard>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.last_id = table.last_id.max(row.local_id);
            table.rows.insert(row.local_id, row);
        }
        table
    }

    pub fn get(&self, local_id: LocalId) -> Option<&OwnedCard> {
        self.rows.get(&local_id)
    }

    pub fn get_by_card_id(&self, card_id: &str) -> Option<&OwnedCard> {
        self.rows.values().find(|c| c.card_id == card_id)
    }

    pub fn upsert(&mut self, card: &OwnedCard) -> Result<OwnedCard, CoreError> {
        card.validate()?;
        let local_id = match self.get_by_card_id(&card.card_id) {
            Some(existing) => existing.local_id,
            None => {
                self.last_id += 1;
                self.last_id
            }
        };
        debug_assert_ne!(local_id, UNSAVED_LOCAL_ID);
        let stored = OwnedCard {
            local_id,
            ..card.clone()
        };
        self.rows.insert(local_id, stored.clone());
        Ok(stored)
    }

    /// Validates every card before touching any row.
    pub fn upsert_all(&mut self, cards: &[OwnedCard]) -> Result<Vec<OwnedCard>, CoreError> {
        for card in cards {
            card.validate()?;
        }
        cards.iter().map(|c| self.upsert(c)).collect()
    }

    /// Missing ids are a no-op.
    pub fn delete(&mut self, local_id: LocalId) -> Option<OwnedCard> {
        self.rows.remove(&local_id)
    }

    pub fn snapshot(&self) -> Vec<OwnedCard> {
        self.rows.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
