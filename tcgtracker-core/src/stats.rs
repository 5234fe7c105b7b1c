use crate::OwnedCard;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct Totals {
    pub total: u32,
    pub favourites: u32,
}

impl Totals {
    pub fn record(&mut self, card: &OwnedCard) {
        self.total += 1;
        if card.favourite {
            self.favourites += 1;
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CollectionStats {
    pub totals: Totals,
    pub per_set: BTreeMap<String, Totals>,
}

impl CollectionStats {
    pub fn largest_set(&self) -> Option<(&str, u32)> {
        self.per_set
            .iter()
            .max_by_key(|(_, t)| t.total)
            .map(|(id, t)| (id.as_str(), t.total))
    }
}

/// Cards flagged as not owned are ignored.
pub fn summarize(cards: &[OwnedCard]) -> CollectionStats {
    let mut stats = CollectionStats::default();
    for card in cards.iter().filter(|c| c.owned) {
        stats.totals.record(card);
        stats
            .per_set
            .entry(card.set_id().to_string())
            .or_default()
            .record(card);
    }
    stats
}
