//! Tunables for the map engine.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Largest fallback arena side, in pixels; the arena is one `Image`.
pub const MAX_ARENA_SIDE: u32 = u16::MAX as u32;

/// Engine tunables, loadable from a TOML file.
///
/// Every field has a default so a config file only needs the keys it changes:
///
/// ```toml
/// cache_step = 4
/// probe_half_extent = 6.0
///
/// [fallback]
/// width = 800
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quantization step of the walkability cache, in pixels. Keep it at or
    /// below half the smallest entity collision radius.
    pub cache_step: u32,
    /// Half size of the square probe tested against collision rectangles.
    pub probe_half_extent: f32,
    /// Maps with at most this many cache cells are scanned eagerly at load.
    pub eager_cell_limit: usize,
    /// Distance from the map border used by the spawn edge scan.
    pub spawn_edge_margin: u32,
    /// Spacing between candidate points of the spawn edge scan.
    pub spawn_edge_step: u32,
    /// Side of the generated "missing image" placeholder, in pixels.
    pub placeholder_size: u16,
    /// Side of one checker cell of the placeholder.
    pub placeholder_cell: u16,
    /// Dimensions of the generated fallback arena.
    pub fallback: FallbackConfig,
}

/// Size of the procedurally generated fallback arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Tile side in pixels.
    pub tile_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_step: 8,
            probe_half_extent: 8.0,
            eager_cell_limit: 1 << 18,
            spawn_edge_margin: 100,
            spawn_edge_step: 50,
            placeholder_size: 32,
            placeholder_cell: 8,
            fallback: FallbackConfig::default(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            tile_size: 32,
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse engine config toml contents")?;
        config.validated()
    }

    /// Reads and parses a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config at {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    fn validated(self) -> Result<Self> {
        anyhow::ensure!(self.cache_step > 0, "cache_step must be positive");
        anyhow::ensure!(self.spawn_edge_step > 0, "spawn_edge_step must be positive");
        anyhow::ensure!(
            self.probe_half_extent.is_finite() && self.probe_half_extent >= 0.0,
            "probe_half_extent must be a non-negative number"
        );
        anyhow::ensure!(self.placeholder_cell > 0, "placeholder_cell must be positive");
        let fb = self.fallback;
        let min_side = fb.tile_size.checked_mul(3);
        anyhow::ensure!(
            fb.tile_size > 0 && min_side.is_some_and(|m| fb.width >= m && fb.height >= m),
            "fallback arena must be at least 3x3 tiles"
        );
        anyhow::ensure!(
            fb.width <= MAX_ARENA_SIDE && fb.height <= MAX_ARENA_SIDE,
            "fallback arena must be at most {MAX_ARENA_SIDE} px per side"
        );
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            cache_step = 4

            [fallback]
            width = 800
            "#,
        )
        .expect("config");

        assert_eq!(config.cache_step, 4);
        assert_eq!(config.spawn_edge_margin, 100);
        assert_eq!(config.fallback.width, 800);
        assert_eq!(config.fallback.height, 480);
    }

    #[test]
    fn rejects_zero_cache_step() {
        let err = EngineConfig::from_toml_str("cache_step = 0").unwrap_err();
        assert!(err.to_string().contains("cache_step"));
    }

    #[test]
    fn rejects_tiny_fallback_arena() {
        let err = EngineConfig::from_toml_str("[fallback]\nwidth = 40").unwrap_err();
        assert!(err.to_string().contains("fallback"));
    }

    #[test]
    fn oversized_fallback_is_rejected_without_overflow() {
        let err = EngineConfig::from_toml_str("[fallback]\ntile_size = 2000000000\n")
            .expect_err("tile size overflows");
        assert!(err.to_string().contains("3x3"));

        let err = EngineConfig::from_toml_str("[fallback]\nwidth = 70000\n")
            .expect_err("wider than an image");
        assert!(err.to_string().contains("at most"));
    }
}
