//! Process-wide store owning the ledger and the recipe catalog
//!
//! Each state sits behind its own `RwLock`. Code that needs both takes the
//! catalog guard first, then the ledger guard.

mod catalog;
mod ledger;

pub use catalog::Catalog;
pub use ledger::{ItemPatch, ItemSearch, Ledger, NewItem};

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::{CatalogConfig, Config};
use crate::error::{AppError, AppResult};

const LEDGER_FILE: &str = "ledger.json";
const CATALOG_FILE: &str = "catalog.json";

pub struct Store {
    ledger: RwLock<Ledger>,
    catalog: RwLock<Catalog>,
    data_dir: Option<PathBuf>,
}

impl Store {
    /// Memory-only store, used by tests and when no data directory is set
    pub fn in_memory(catalog: &CatalogConfig) -> Self {
        Self {
            ledger: RwLock::new(Ledger::new()),
            catalog: RwLock::new(Catalog::with_dish_types(&catalog.extra_dish_types)),
            data_dir: None,
        }
    }

    /// Open the store described by `config`, restoring snapshots when present
    pub async fn open(config: &Config) -> AppResult<Self> {
        let Some(dir) = config.storage.data_dir.clone() else {
            tracing::info!("No data directory configured, running in memory");
            return Ok(Self::in_memory(&config.catalog));
        };

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("cannot create {}: {}", dir.display(), e)))?;

        let ledger: Ledger = read_snapshot(&dir.join(LEDGER_FILE))
            .await?
            .unwrap_or_default();
        let mut catalog = read_snapshot::<Catalog>(&dir.join(CATALOG_FILE))
            .await?
            .unwrap_or_default();
        catalog.merge_dish_types(&config.catalog.extra_dish_types);

        tracing::info!(
            data_dir = %dir.display(),
            items = ledger.len(),
            dishes = catalog.len(),
            "Store opened"
        );

        Ok(Self {
            ledger: RwLock::new(ledger),
            catalog: RwLock::new(catalog),
            data_dir: Some(dir),
        })
    }

    pub fn storage_mode(&self) -> &'static str {
        if self.data_dir.is_some() {
            "snapshot"
        } else {
            "memory"
        }
    }

    pub async fn ledger(&self) -> RwLockReadGuard<'_, Ledger> {
        self.ledger.read().await
    }

    pub async fn ledger_mut(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.ledger.write().await
    }

    pub async fn catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().await
    }

    pub async fn catalog_mut(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().await
    }

    /// Persist `staged`, then swap it in for `live`.
    ///
    /// `staged` is a modified copy of `live` taken under the same write
    /// guard. When the snapshot cannot be written `live` is left as it was.
    pub async fn commit_ledger(&self, live: &mut Ledger, staged: Ledger) -> AppResult<()> {
        self.persist_ledger(&staged).await?;
        *live = staged;
        Ok(())
    }

    pub async fn commit_catalog(&self, live: &mut Catalog, staged: Catalog) -> AppResult<()> {
        self.persist_catalog(&staged).await?;
        *live = staged;
        Ok(())
    }

    async fn persist_ledger(&self, ledger: &Ledger) -> AppResult<()> {
        match &self.data_dir {
            Some(dir) => write_snapshot(&dir.join(LEDGER_FILE), ledger).await,
            None => Ok(()),
        }
    }

    async fn persist_catalog(&self, catalog: &Catalog) -> AppResult<()> {
        match &self.data_dir {
            Some(dir) => write_snapshot(&dir.join(CATALOG_FILE), catalog).await,
            None => Ok(()),
        }
    }

    /// Flush both snapshots
    pub async fn flush(&self) -> AppResult<()> {
        let catalog = self.catalog.read().await;
        let ledger = self.ledger.read().await;
        self.persist_catalog(&catalog).await?;
        self.persist_ledger(&ledger).await
    }

    pub async fn shutdown(&self) -> AppResult<()> {
        self.flush().await?;
        tracing::info!(mode = self.storage_mode(), "Store closed");
        Ok(())
    }
}

async fn read_snapshot<T: DeserializeOwned>(path: &Path) -> AppResult<Option<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::Storage(format!(
                "cannot read {}: {}",
                path.display(),
                e
            )))
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| AppError::Storage(format!("corrupt snapshot {}: {}", path.display(), e)))
}

/// Serialize to a sibling temp file, then rename over the snapshot
async fn write_snapshot<T: Serialize>(path: &Path, state: &T) -> AppResult<()> {
    let json = serde_json::to_vec_pretty(state)
        .map_err(|e| AppError::Storage(format!("cannot serialize snapshot: {}", e)))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| AppError::Storage(format!("cannot write {}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| AppError::Storage(format!("cannot replace {}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "Snapshot written");
    Ok(())
}
