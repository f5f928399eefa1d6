//! Process-wide, load-once parameter catalog.
//!
//! The descriptor is read and parsed at most once. Every caller gets the same
//! `Arc<Catalog>`, or the same fatal error if the first load failed.

use patchwright_core::{Catalog, CatalogError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub struct CatalogStore {
    path: PathBuf,
    cell: OnceLock<Result<Arc<Catalog>, CatalogError>>,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> Result<Arc<Catalog>, CatalogError> {
        self.cell
            .get_or_init(|| match Catalog::load(&self.path) {
                Ok(catalog) => Ok(Arc::new(catalog)),
                Err(err) => {
                    tracing::error!(path = %self.path.display(), error = %err, "catalog failed to load");
                    Err(err)
                }
            })
            .clone()
    }
}

static GLOBAL: OnceLock<CatalogStore> = OnceLock::new();

/// Install the process store. Later calls keep the first path.
pub fn install(path: impl Into<PathBuf>) -> &'static CatalogStore {
    let path = path.into();
    let store = GLOBAL.get_or_init(|| CatalogStore::new(path.clone()));
    if store.path() != path {
        tracing::debug!(
            installed = %store.path().display(),
            requested = %path.display(),
            "catalog store already installed; keeping the first path"
        );
    }
    store
}

pub fn global() -> Option<&'static CatalogStore> {
    GLOBAL.get()
}
