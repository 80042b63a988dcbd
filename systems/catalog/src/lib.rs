#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave catalog parsed once from static wave data.
//!
//! Loading never fails the game: the soft entry points log the problem and
//! fall back to an empty catalog, which the wave controller reads as "no more
//! waves". Asset resolution is cached per enemy id so the underlying resolver
//! is consulted at most once for every enemy that resolves successfully.

use std::{collections::HashMap, fs, io, path::Path, path::PathBuf};

use plot_defence_core::{AssetHandle, AssetResolver, EnemyCatalogEntry, WaveDef, WavesDocument};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Failures raised while loading wave data or resolving enemy assets.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No wave document was supplied.
    #[error("wave document is missing")]
    MissingSource,
    /// The wave document could not be read from disk.
    #[error("could not read wave document at {}", path.display())]
    Unreadable {
        /// Location that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The wave document is not valid wave JSON.
    #[error("could not parse wave document")]
    Malformed(#[from] serde_json::Error),
    /// A spawn named an empty enemy id.
    #[error("enemy id is empty")]
    EmptyEnemyId,
    /// A spawn named an enemy the catalog does not define.
    #[error("enemy id `{0}` is not in the catalog")]
    UnknownEnemy(String),
    /// The catalog entry points at an asset the resolver cannot load.
    #[error("asset `{asset_ref}` for enemy `{enemy}` could not be resolved")]
    UnresolvableAsset {
        /// Enemy whose asset failed to load.
        enemy: String,
        /// Asset reference handed to the resolver.
        asset_ref: String,
    },
}

/// In-memory wave and enemy definitions with a resolved-asset cache.
#[derive(Debug, Default)]
pub struct WaveCatalog {
    version: i32,
    pre_determined_waves: i32,
    waves: Vec<WaveDef>,
    enemies: HashMap<String, EnemyCatalogEntry>,
    resolved: HashMap<String, AssetHandle>,
}

impl WaveCatalog {
    /// Creates a catalog without enemies or waves.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a catalog from an already parsed document.
    #[must_use]
    pub fn from_document(document: WavesDocument) -> Self {
        let mut enemies = HashMap::with_capacity(document.enemy_catalog.len());
        for entry in document.enemy_catalog {
            if entry.id.is_empty() {
                warn!("skipping enemy catalog entry without an id");
                continue;
            }
            let id = entry.id.clone();
            if enemies.insert(id.clone(), entry).is_some() {
                debug!(enemy = %id, "duplicate enemy catalog entry replaced");
            }
        }

        Self {
            version: document.version,
            pre_determined_waves: document.pre_determined_waves,
            waves: document.waves,
            enemies,
            resolved: HashMap::new(),
        }
    }

    /// Parses wave JSON, reporting malformed data to the caller.
    pub fn from_json(source: &str) -> Result<Self, CatalogError> {
        let document: WavesDocument = serde_json::from_str(source)?;
        Ok(Self::from_document(document))
    }

    /// Parses wave JSON, logging failures and substituting an empty catalog.
    #[must_use]
    pub fn load(source: Option<&str>) -> Self {
        let result = source
            .ok_or(CatalogError::MissingSource)
            .and_then(Self::from_json);
        Self::or_empty(result)
    }

    /// Reads and parses a wave file, logging failures and substituting an
    /// empty catalog.
    #[must_use]
    pub fn load_path(path: &Path) -> Self {
        let result = fs::read_to_string(path)
            .map_err(|source| CatalogError::Unreadable {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|contents| Self::from_json(&contents));
        Self::or_empty(result)
    }

    fn or_empty(result: Result<Self, CatalogError>) -> Self {
        match result {
            Ok(catalog) => {
                debug!(
                    waves = catalog.waves.len(),
                    enemies = catalog.enemies.len(),
                    "wave catalog loaded"
                );
                catalog
            }
            Err(err) => {
                error!(error = %err, "wave catalog unavailable, continuing without waves");
                Self::empty()
            }
        }
    }

    /// Format revision declared by the document.
    #[must_use]
    pub const fn version(&self) -> i32 {
        self.version
    }

    /// Number of hand-authored waves declared by the document.
    #[must_use]
    pub const fn pre_determined_waves(&self) -> i32 {
        self.pre_determined_waves
    }

    /// Number of waves held by the catalog.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Looks up the enemy definition registered under `id`.
    #[must_use]
    pub fn enemy(&self, id: &str) -> Option<&EnemyCatalogEntry> {
        self.enemies.get(id)
    }

    /// Looks up a wave for the controller's wave number.
    ///
    /// Resolution order is fixed: a wave whose id equals `index`, then the
    /// wave at zero-based position `index`, then a wave whose id equals
    /// `index + 1`. `None` means the catalog has no more waves.
    #[must_use]
    pub fn wave(&self, index: u32) -> Option<&WaveDef> {
        if let Some(wave) = self.find_id(i64::from(index)) {
            return Some(wave);
        }

        if let Some(wave) = usize::try_from(index)
            .ok()
            .and_then(|position| self.waves.get(position))
        {
            debug!(index, id = wave.id, "wave resolved by position");
            return Some(wave);
        }

        let wave = self.find_id(i64::from(index) + 1)?;
        debug!(index, id = wave.id, "wave resolved by id + 1");
        Some(wave)
    }

    fn find_id(&self, id: i64) -> Option<&WaveDef> {
        self.waves.iter().find(|wave| i64::from(wave.id) == id)
    }

    /// Resolves the spawnable asset for an enemy id, caching the handle.
    ///
    /// Failures are logged and returned; callers skip the spawn.
    pub fn resolve_asset<R>(
        &mut self,
        enemy_id: &str,
        resolver: &mut R,
    ) -> Result<AssetHandle, CatalogError>
    where
        R: AssetResolver + ?Sized,
    {
        if enemy_id.is_empty() {
            error!("asset lookup with an empty enemy id");
            return Err(CatalogError::EmptyEnemyId);
        }

        if let Some(handle) = self.resolved.get(enemy_id) {
            return Ok(*handle);
        }

        let Some(entry) = self.enemies.get(enemy_id) else {
            error!(enemy = enemy_id, "enemy id not in catalog");
            return Err(CatalogError::UnknownEnemy(enemy_id.to_owned()));
        };

        let Some(handle) = resolver.resolve(&entry.asset_ref) else {
            error!(
                enemy = enemy_id,
                asset = %entry.asset_ref,
                "asset resolver could not load enemy asset"
            );
            return Err(CatalogError::UnresolvableAsset {
                enemy: enemy_id.to_owned(),
                asset_ref: entry.asset_ref.clone(),
            });
        };

        let _ = self.resolved.insert(enemy_id.to_owned(), handle);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_without_ids_are_skipped() {
        let catalog = WaveCatalog::from_json(
            r#"{"enemyCatalog": [{"id": "", "assetRef": "ghost"}, {"id": "bat", "assetRef": "Bat"}]}"#,
        )
        .expect("document parses");
        assert!(catalog.enemy("").is_none());
        assert_eq!(catalog.enemy("bat").map(|e| e.asset_ref.as_str()), Some("Bat"));
    }

    #[test]
    fn missing_source_yields_empty_catalog() {
        let catalog = WaveCatalog::load(None);
        assert_eq!(catalog.wave_count(), 0);
        assert!(catalog.wave(0).is_none());
    }
}
