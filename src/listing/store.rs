//! Published listing, replaced atomically

use std::sync::Arc;

use tokio::sync::watch;

use super::types::FileListing;

/// Holder of the current [`FileListing`].
///
/// Readers get `Arc` snapshots; writers swap in a whole new listing, so a
/// half-built one is never visible. Subscribers are woken on every change.
#[derive(Clone)]
pub struct ListingStore {
    tx: Arc<watch::Sender<Arc<FileListing>>>,
}

impl ListingStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(FileListing::empty()));
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Arc<FileListing> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FileListing>> {
        self.tx.subscribe()
    }

    /// Replace the listing wholesale
    pub fn publish(&self, listing: FileListing) -> Arc<FileListing> {
        let listing = Arc::new(listing);
        self.tx.send_replace(listing.clone());
        listing
    }

    /// Drop one entry. Returns `false` if it was not listed.
    pub fn remove(&self, filename: &str) -> bool {
        self.tx.send_if_modified(|current| match current.without(filename) {
            Some(next) => {
                *current = Arc::new(next);
                true
            }
            None => false,
        })
    }

    pub fn clear(&self) {
        self.publish(FileListing::empty());
    }
}

impl Default for ListingStore {
    fn default() -> Self {
        Self::new()
    }
}
