// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `GeoStore` trait.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use geomon_config::model::StorageConfig;
use geomon_core::types::{GeoReport, Message};
use geomon_core::{GeomonError, GeoStore};

use crate::database::Database;
use crate::queries;
use crate::queries::campaigns::CampaignState;

/// SQLite-backed durable store.
///
/// Wraps a [`Database`] handle and delegates all operations to the typed
/// query modules. The database is lazily initialized on the first call to
/// [`SqliteStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize)
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), GeomonError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| GeomonError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    /// Checkpoint and release the database.
    pub async fn close(&self) -> Result<(), GeomonError> {
        self.db()?.close().await
    }

    fn db(&self) -> Result<&Database, GeomonError> {
        self.db.get().ok_or_else(|| GeomonError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl GeoStore for SqliteStore {
    async fn save_messages(&self, messages: &[Message]) -> Result<(), GeomonError> {
        queries::messages::save(self.db()?, messages).await
    }

    async fn find_all_messages(&self) -> Result<Vec<Message>, GeomonError> {
        queries::messages::find_all(self.db()?).await
    }

    async fn delete_messages_by_ids(&self, ids: &[String]) -> Result<(), GeomonError> {
        queries::messages::delete_by_ids(self.db()?, ids).await
    }

    async fn delete_all_messages(&self) -> Result<(), GeomonError> {
        queries::messages::delete_all(self.db()?).await
    }

    async fn update_message_ids(
        &self,
        mapping: &HashMap<String, String>,
    ) -> Result<(), GeomonError> {
        queries::messages::update_ids(self.db()?, mapping).await
    }

    async fn add_unreported_events(&self, reports: &[GeoReport]) -> Result<(), GeomonError> {
        queries::events::add(self.db()?, reports).await
    }

    async fn unreported_events(&self) -> Result<Vec<GeoReport>, GeomonError> {
        queries::events::snapshot(self.db()?).await
    }

    async fn remove_unreported_events(&self, message_ids: &[String]) -> Result<(), GeomonError> {
        queries::events::remove_by_message_ids(self.db()?, message_ids).await
    }

    async fn finished_campaign_ids(&self) -> Result<HashSet<String>, GeomonError> {
        queries::campaigns::ids_for_state(self.db()?, CampaignState::Finished).await
    }

    async fn suspended_campaign_ids(&self) -> Result<HashSet<String>, GeomonError> {
        queries::campaigns::ids_for_state(self.db()?, CampaignState::Suspended).await
    }

    async fn add_finished_campaign_ids(&self, ids: &[String]) -> Result<(), GeomonError> {
        queries::campaigns::add_ids(self.db()?, CampaignState::Finished, ids).await
    }

    async fn add_suspended_campaign_ids(&self, ids: &[String]) -> Result<(), GeomonError> {
        queries::campaigns::add_ids(self.db()?, CampaignState::Suspended, ids).await
    }

    async fn monitoring_active(&self) -> Result<bool, GeomonError> {
        queries::prefs::get_bool(self.db()?, queries::prefs::MONITORING_ACTIVE).await
    }

    async fn set_monitoring_active(&self, active: bool) -> Result<(), GeomonError> {
        queries::prefs::set_bool(self.db()?, queries::prefs::MONITORING_ACTIVE, active).await
    }
}
