//! Pages connected to the worker.
//!
//! Each page gets an unbounded channel of [`ClientNotice`]s. Pages whose
//! receiver has been dropped are forgotten on the next broadcast.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};

use super::message::ClientNotice;

pub type ClientId = u64;

struct Page {
    id: ClientId,
    controlled: bool,
    tx: mpsc::UnboundedSender<ClientNotice>,
}

#[derive(Default)]
pub struct ClientRegistry {
    pages: RwLock<Vec<Page>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page. It stays uncontrolled until the next `claim`.
    pub async fn connect(&self) -> (ClientId, mpsc::UnboundedReceiver<ClientNotice>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.pages.write().await.push(Page { id, controlled: false, tx });
        (id, rx)
    }

    /// Forget a page. Returns whether it was connected.
    pub async fn disconnect(&self, id: ClientId) -> bool {
        let mut pages = self.pages.write().await;
        let before = pages.len();
        pages.retain(|p| p.id != id);
        pages.len() < before
    }

    /// Take control of every connected page. Returns how many pages are now controlled.
    pub async fn claim(&self) -> usize {
        let mut pages = self.pages.write().await;
        for page in pages.iter_mut() {
            page.controlled = true;
        }
        pages.len()
    }

    pub async fn is_controlled(&self, id: ClientId) -> bool {
        self.pages.read().await.iter().any(|p| p.id == id && p.controlled)
    }

    /// Post one copy of `notice` to every page. Returns the number delivered.
    pub async fn broadcast(&self, notice: &ClientNotice) -> usize {
        let mut pages = self.pages.write().await;
        pages.retain(|page| page.tx.send(notice.clone()).is_ok());
        pages.len()
    }

    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }
}
