//! Background catalog fetching.
//!
//! The loader runs at most one fetch at a time. Starting a new load aborts the
//! previous task; results that still slip through are rejected by the engine's
//! ticket check.

use std::{fmt, sync::Arc};

use knobs_types::ProviderDescriptor;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

use super::SwitchTicket;
use crate::catalog::{CatalogSource, CatalogSourceError};

/// A finished fetch, ready for [`super::SyncEngine::apply_catalog`].
#[derive(Debug)]
pub struct CatalogLoaded {
    pub ticket: SwitchTicket,
    pub result: Result<ProviderDescriptor, CatalogSourceError>,
}

/// Single-flight fetcher that feeds catalog results back to the engine.
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    sender: mpsc::UnboundedSender<CatalogLoaded>,
    in_flight: Option<JoinHandle<()>>,
}

impl CatalogLoader {
    /// Creates a loader and the receiver its results are delivered on.
    pub fn new(source: Arc<dyn CatalogSource>) -> (Self, mpsc::UnboundedReceiver<CatalogLoaded>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let loader = Self {
            source,
            sender,
            in_flight: None,
        };
        (loader, receiver)
    }

    /// Fetches the catalog for `ticket` on the tokio runtime.
    pub fn load(&mut self, ticket: SwitchTicket) {
        self.cancel();
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        debug!(provider_id = %ticket.provider_id, generation = ticket.generation, "catalog fetch spawned");
        self.in_flight = Some(tokio::spawn(async move {
            let result = source.fetch(&ticket.provider_id).await;
            // Receiver gone means the panel closed.
            let _ = sender.send(CatalogLoaded { ticket, result });
        }));
    }

    /// Aborts the in-flight fetch, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.in_flight.take()
            && !handle.is_finished()
        {
            debug!("aborting in-flight catalog fetch");
            handle.abort();
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl fmt::Debug for CatalogLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogLoader")
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

impl Drop for CatalogLoader {
    fn drop(&mut self) {
        self.cancel();
    }
}
