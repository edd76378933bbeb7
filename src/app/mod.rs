//! Storage demo: copies a file into a private cache directory and a
//! shared directory, then reads the copies back, each through its own
//! [`GrState`] slot.

pub mod storage;

use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::dispatch::{Context, Program};
use crate::error::{ApiError, Retryable};
use crate::load::{load, load_or_update};
use crate::state::{GrState, Lens, Slot};

/// Failure stored in [`AppState`] slots.
pub type AppError = Retryable<StorageProgram, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Msg {
    /// Copy the source file into the cache directory.
    StoreToLocal,
    /// Copy the source file into the shared directory.
    StoreToExternal,
    /// Copy the source file to a path picked by the user.
    StoreToDocument { target: PathBuf },
    ReadFromLocal,
    ReadFromExternal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AppState {
    pub stored_local: Option<GrState<AppError, PathBuf>>,
    pub stored_external: Option<GrState<AppError, PathBuf>>,
    pub read_local: Option<GrState<AppError, String>>,
    pub read_external: Option<GrState<AppError, String>>,
}

impl AppState {
    pub fn stored_local() -> Slot<AppState, AppError, PathBuf> {
        Lens::new(
            |state: &AppState| state.stored_local.clone(),
            |state, stored_local| AppState {
                stored_local,
                ..state
            },
        )
    }

    pub fn stored_external() -> Slot<AppState, AppError, PathBuf> {
        Lens::new(
            |state: &AppState| state.stored_external.clone(),
            |state, stored_external| AppState {
                stored_external,
                ..state
            },
        )
    }

    pub fn read_local() -> Slot<AppState, AppError, String> {
        Lens::new(
            |state: &AppState| state.read_local.clone(),
            |state, read_local| AppState { read_local, ..state },
        )
    }

    pub fn read_external() -> Slot<AppState, AppError, String> {
        Lens::new(
            |state: &AppState| state.read_external.clone(),
            |state, read_external| AppState {
                read_external,
                ..state
            },
        )
    }

    /// Both copies finished, successfully or not.
    pub fn stores_settled(&self) -> bool {
        settled(&self.stored_local) && settled(&self.stored_external)
    }

    /// Both reads finished, successfully or not.
    pub fn reads_settled(&self) -> bool {
        settled(&self.read_local) && settled(&self.read_external)
    }

    /// Errors of every failed slot, including failed refreshes.
    pub fn failures(&self) -> Vec<&AppError> {
        fn failure<V>(slot: &Option<GrState<AppError, V>>) -> Option<&AppError> {
            let slot = slot.as_ref()?;
            slot.failure()
                .or_else(|| slot.update().and_then(|update| update.failure()))
        }

        [
            failure(&self.stored_local),
            failure(&self.stored_external),
            failure(&self.read_local),
            failure(&self.read_external),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn settled<V>(slot: &Option<GrState<AppError, V>>) -> bool {
    slot.as_ref().is_some_and(|slot| !slot.is_loading_or_update())
}

/// Program behind the storage demo. Holds the file to copy and the two
/// target directories.
#[derive(Debug, Clone)]
pub struct StorageProgram {
    source: PathBuf,
    cache_dir: PathBuf,
    external_dir: PathBuf,
}

impl StorageProgram {
    pub fn new(
        source: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        external_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            cache_dir: cache_dir.into(),
            external_dir: external_dir.into(),
        }
    }

    pub fn from_config(source: impl Into<PathBuf>, config: &StorageConfig) -> Self {
        Self::new(source, config.cache_dir(), config.external_dir())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn external_dir(&self) -> &Path {
        &self.external_dir
    }
}

impl Program for StorageProgram {
    type State = AppState;
    type Msg = Msg;

    async fn update(&self, ctx: Context<Self>, msg: Msg) -> anyhow::Result<()> {
        let source = self.source.clone();
        match msg {
            Msg::StoreToLocal => {
                let dir = self.cache_dir.clone();
                load(&ctx, &AppState::stored_local(), move |worker| {
                    storage::copy_into(worker, &source, &dir)
                })
                .await;
            }
            Msg::StoreToExternal => {
                let dir = self.external_dir.clone();
                load(&ctx, &AppState::stored_external(), move |worker| {
                    storage::copy_into(worker, &source, &dir)
                })
                .await;
            }
            Msg::StoreToDocument { target } => {
                load(&ctx, &AppState::stored_external(), move |worker| {
                    storage::copy_to(worker, &source, &target)
                })
                .await;
            }
            Msg::ReadFromLocal => {
                let dir = self.cache_dir.clone();
                load_or_update(&ctx, &AppState::read_local(), move |worker| {
                    storage::target_path(&source, &dir)
                        .and_then(|path| storage::read_text(worker, &path))
                })
                .await;
            }
            Msg::ReadFromExternal => {
                let stored = ctx.read(|state| {
                    state
                        .stored_external
                        .as_ref()
                        .and_then(GrState::value)
                        .cloned()
                });
                let dir = self.external_dir.clone();
                load_or_update(&ctx, &AppState::read_external(), move |worker| {
                    let path = match stored {
                        Some(path) => path,
                        None => storage::target_path(&source, &dir)?,
                    };
                    storage::read_text(worker, &path)
                })
                .await;
            }
        }
        Ok(())
    }
}
