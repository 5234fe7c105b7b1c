use crate::OwnedCard;
use tokio::sync::watch;

pub struct OwnedCardsFeed {
    tx: watch::Sender<Vec<OwnedCard>>,
}

impl OwnedCardsFeed {
    pub fn new(initial: Vec<OwnedCard>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn publish(&self, snapshot: Vec<OwnedCard>) {
        self.tx.send_replace(snapshot);
    }

    pub fn subscribe(&self) -> OwnedCardsStream {
        OwnedCardsStream {
            rx: self.tx.subscribe(),
            primed: false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for OwnedCardsFeed {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

pub struct OwnedCardsStream {
    rx: watch::Receiver<Vec<OwnedCard>>,
    primed: bool,
}

impl OwnedCardsStream {
    /// Waits for the next snapshot. The first call returns immediately.
    /// Returns `None` once the owning store has been dropped.
    pub async fn next(&mut self) -> Option<Vec<OwnedCard>> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn latest(&self) -> Vec<OwnedCard> {
        self.rx.borrow().clone()
    }
}
