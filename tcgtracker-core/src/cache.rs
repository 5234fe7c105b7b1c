use crate::CatalogueCardSummary;
use parking_lot::RwLock;

// Empty means "fetch"; `invalidate` starts a new generation.
#[derive(Default)]
pub struct SummaryCache {
    cards: RwLock<Vec<CatalogueCardSummary>>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<CatalogueCardSummary> {
        self.cards.read().clone()
    }

    pub fn fill(&self, cards: Vec<CatalogueCardSummary>) {
        *self.cards.write() = cards;
    }

    pub fn invalidate(&self) {
        self.cards.write().clear();
    }

    /// Case-insensitive substring match on the card name.
    pub fn matching_name(&self, query: &str) -> Vec<CatalogueCardSummary> {
        crate::filters::filter_summaries_by_name(&self.cards.read(), query)
    }
}
