use crate::{CatalogueCardSummary, OwnedCard};

pub fn filter_summaries_by_name(cards: &[CatalogueCardSummary], query: &str) -> Vec<CatalogueCardSummary> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }
    cards
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&q))
        .cloned()
        .collect()
}

pub fn filter_favourites(cards: &[OwnedCard]) -> Vec<OwnedCard> {
    cards.iter().filter(|c| c.favourite).cloned().collect()
}

pub fn filter_by_set(cards: &[OwnedCard], set_id: &str) -> Vec<OwnedCard> {
    let q = set_id.trim().to_lowercase();
    cards
        .iter()
        .filter(|c| c.set_id().to_lowercase() == q)
        .cloned()
        .collect()
}

pub fn filter_owned_by_name(cards: &[OwnedCard], query: &str) -> Vec<OwnedCard> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&q) || c.card_id.to_lowercase().contains(&q))
        .cloned()
        .collect()
}
