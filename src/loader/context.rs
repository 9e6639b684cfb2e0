//! Inputs of a map load.

use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::resource::{FileResolver, ResourceResolver};

enum Resolver {
    /// Built from the asset root; follows the config's placeholder size.
    Files(FileResolver),
    Custom(Box<dyn ResourceResolver>),
}

/// Everything a map load needs, passed explicitly.
pub struct MapLoadContext {
    map_path: PathBuf,
    search_dirs: Vec<PathBuf>,
    resolver: Resolver,
    config: EngineConfig,
}

impl MapLoadContext {
    /// Loads `map_path`, resolving tile images with a [`FileResolver`]
    /// rooted at `asset_root`.
    pub fn new(map_path: impl Into<PathBuf>, asset_root: impl Into<PathBuf>) -> Self {
        let config = EngineConfig::default();
        let resolver = FileResolver::new(asset_root)
            .with_placeholder(config.placeholder_size, config.placeholder_cell);
        Self {
            map_path: map_path.into(),
            search_dirs: Vec::new(),
            resolver: Resolver::Files(resolver),
            config,
        }
    }

    /// Replaces the filesystem resolver.
    pub fn with_resolver(mut self, resolver: impl ResourceResolver + 'static) -> Self {
        self.resolver = Resolver::Custom(Box::new(resolver));
        self
    }

    /// Adds a directory tried (with the map's file name) when the map path
    /// itself does not exist.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Replaces the engine config. The default filesystem resolver picks up
    /// its placeholder size; a custom resolver is left alone.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        if let Resolver::Files(files) = &mut self.resolver {
            files.set_placeholder(config.placeholder_size, config.placeholder_cell);
        }
        self.config = config;
        self
    }

    /// Map path as given, before search directories are tried.
    pub fn map_path(&self) -> &Path {
        &self.map_path
    }

    /// Resolver used for tile images.
    pub fn resolver(&self) -> &dyn ResourceResolver {
        match &self.resolver {
            Resolver::Files(files) => files as &dyn ResourceResolver,
            Resolver::Custom(custom) => custom.as_ref(),
        }
    }

    /// Engine config applied to the loaded map.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// First existing file among the map path and the search directories.
    pub fn locate_map(&self) -> Option<PathBuf> {
        if self.map_path.is_file() {
            return Some(self.map_path.clone());
        }
        let name = self.map_path.file_name()?;
        self.search_dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|p| p.is_file())
    }
}
