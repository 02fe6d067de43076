//! Dashboard data client for the Warehouse Operations Platform
//!
//! Screens read through per-entity caches kept fresh by pollers and write
//! through single-purpose API calls. Failures surface as [`ActionNotice`]s,
//! never as raw errors.

pub mod alerts;
pub mod api;
pub mod cache;
pub mod checklist;
pub mod config;
pub mod error;
pub mod notice;
pub mod poller;

use std::future::Future;

use shared::Versioned;

pub use alerts::ReorderList;
pub use api::ApiClient;
pub use cache::{write_through, EntityCache, FetchTicket, MergeOutcome, MergeReport, SharedCache};
pub use checklist::{toggle_check, ToggleOutcome};
pub use config::{ClientConfig, PollingConfig};
pub use error::{ClientError, ClientResult};
pub use notice::{ActionNotice, NoticeBoard, NoticeKind};
pub use poller::{Poller, Screen};

/// An API client plus the poll cadence for each screen
#[derive(Clone)]
pub struct Dashboard {
    api: ApiClient,
    polling: PollingConfig,
}

impl Dashboard {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            api: ApiClient::new(config)?,
            polling: config.polling.clone(),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Keep `cache` fresh at `screen`'s interval using `fetch`
    pub fn watch<T, F, Fut>(&self, screen: Screen, cache: SharedCache<T>, fetch: F) -> Poller
    where
        T: Versioned + Send + 'static,
        T::Key: Send,
        F: Fn(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = ClientResult<Vec<T>>> + Send,
    {
        let api = self.api.clone();
        Poller::spawn(screen, self.polling.interval(screen), cache, move || fetch(api.clone()))
    }
}
