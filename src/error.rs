use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors produced while locating and decoding an authored map.
///
/// None of these reach the player: [`crate::TileMap::load`] turns every
/// variant into a transition to the fallback arena.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading a map or tileset file failed.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A map or tileset file was not valid JSON for the expected shape.
    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// The map file is not a JSON map.
    #[error("unsupported map format: {0}")]
    UnsupportedFormat(String),
    /// Structurally invalid map data.
    #[error("invalid map: {0}")]
    InvalidMap(String),
    /// A tile layer's data length does not match its declared size.
    #[error("invalid layer size for layer '{layer}': expected {expected} cells, found {found}")]
    InvalidLayerSize {
        /// Offending layer name.
        layer: String,
        /// `width * height` of the layer.
        expected: usize,
        /// Actual length of the data array.
        found: usize,
    },
    /// A custom property declared a type this loader does not understand.
    #[error("unsupported property type '{kind}' for property '{name}'")]
    UnsupportedPropertyType {
        /// Property name.
        name: String,
        /// Declared Tiled type.
        kind: String,
    },
    /// The map is too large to composite into a single image.
    #[error("map is {width}x{height} px, larger than the {max} px composite limit")]
    MapTooLarge {
        /// Pixel width.
        width: u32,
        /// Pixel height.
        height: u32,
        /// Largest supported side.
        max: u32,
    },
}
