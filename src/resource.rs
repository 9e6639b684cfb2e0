//! Tile image resolution.

use std::fs;
use std::path::{Component, Path, PathBuf};

use macroquad::prelude::*;

use crate::render::{blank_image, fill_rect, Rgba};

const MAGENTA: Rgba = [255, 0, 255, 255];
const BLACK_PX: Rgba = [0, 0, 0, 255];

/// Turns a tile image reference into pixels.
///
/// Implementations must not fail: a missing or undecodable image yields a
/// placeholder so the rest of the map still loads.
pub trait ResourceResolver {
    /// Resolves `reference` (as written in the map or tileset) relative to
    /// `base`, the directory of the map file.
    fn resolve(&self, reference: &str, base: &Path) -> Image;
}

/// Magenta/black checkerboard of `size` pixels with `cell` sized squares.
pub fn placeholder_image(size: u16, cell: u16) -> Image {
    let size = size.max(1) as u32;
    let cell = cell.max(1) as u32;
    let mut img = blank_image(size, size);
    for y in (0..size).step_by(cell as usize) {
        for x in (0..size).step_by(cell as usize) {
            let color = if ((x / cell) + (y / cell)) % 2 == 0 {
                MAGENTA
            } else {
                BLACK_PX
            };
            fill_rect(
                &mut img,
                Rect::new(x as f32, y as f32, cell as f32, cell as f32),
                color,
            );
        }
    }
    img
}

/// Resolves references against the filesystem.
///
/// Candidates, in order:
/// 1. `base/reference`
/// 2. for references escaping the map directory (`../..`), the bare file
///    name under each asset directory
/// 3. the bare file name under the asset root
/// 4. `reference` as given
#[derive(Debug, Clone)]
pub struct FileResolver {
    asset_root: PathBuf,
    asset_dirs: Vec<PathBuf>,
    placeholder_size: u16,
    placeholder_cell: u16,
}

impl FileResolver {
    /// Uses `<asset_root>/tilesets` and `<asset_root>/tiles` as asset dirs.
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        let asset_root = asset_root.into();
        Self {
            asset_dirs: vec![asset_root.join("tilesets"), asset_root.join("tiles")],
            asset_root,
            placeholder_size: 32,
            placeholder_cell: 8,
        }
    }

    /// Replaces the directories searched for references escaping the map directory.
    pub fn with_asset_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.asset_dirs = dirs;
        self
    }

    /// Size and checker cell of the placeholder for unresolved images.
    pub fn with_placeholder(mut self, size: u16, cell: u16) -> Self {
        self.set_placeholder(size, cell);
        self
    }

    pub(crate) fn set_placeholder(&mut self, size: u16, cell: u16) {
        self.placeholder_size = size;
        self.placeholder_cell = cell;
    }

    /// Candidate paths for `reference`, in lookup order.
    pub fn candidates(&self, reference: &str, base: &Path) -> Vec<PathBuf> {
        let rel = Path::new(reference);
        let mut out = vec![base.join(rel)];
        let file_name = rel.file_name().map(PathBuf::from);

        if let Some(name) = &file_name {
            let escapes = rel.components().any(|c| matches!(c, Component::ParentDir));
            if escapes {
                out.extend(self.asset_dirs.iter().map(|d| d.join(name)));
            }
            out.push(self.asset_root.join(name));
        }
        out.push(rel.to_path_buf());
        out.dedup();
        out
    }

    fn decode(path: &Path) -> Option<Image> {
        let bytes = fs::read(path).ok()?;
        match Image::from_file_with_format(&bytes, None) {
            Ok(img) => Some(img),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to decode image");
                None
            }
        }
    }
}

impl ResourceResolver for FileResolver {
    fn resolve(&self, reference: &str, base: &Path) -> Image {
        for path in self.candidates(reference, base) {
            if !path.is_file() {
                continue;
            }
            if let Some(img) = Self::decode(&path) {
                tracing::debug!(reference, path = %path.display(), "resolved image");
                return img;
            }
        }

        tracing::warn!(reference, base = %base.display(), "missing image resource; using placeholder");
        placeholder_image(self.placeholder_size, self.placeholder_cell)
    }
}

/// Never touches the filesystem; every reference becomes a placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderResolver;

impl ResourceResolver for PlaceholderResolver {
    fn resolve(&self, reference: &str, _base: &Path) -> Image {
        tracing::debug!(reference, "placeholder resolver");
        placeholder_image(32, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pixel;

    #[test]
    fn placeholder_is_a_deterministic_checkerboard() {
        let img = placeholder_image(32, 8);
        assert_eq!((img.width, img.height), (32, 32));
        assert_eq!(pixel(&img, 0, 0), MAGENTA);
        assert_eq!(pixel(&img, 8, 0), BLACK_PX);
        assert_eq!(pixel(&img, 8, 8), MAGENTA);
        assert_eq!(pixel(&img, 31, 0), BLACK_PX);
        assert_eq!(img.bytes, placeholder_image(32, 8).bytes);
    }

    #[test]
    fn escaping_references_search_asset_dirs() {
        let r = FileResolver::new("assets");
        let got = r.candidates("../../tilesets/TileSet_1.png", Path::new("maps/level1"));
        assert_eq!(
            got,
            vec![
                PathBuf::from("maps/level1/../../tilesets/TileSet_1.png"),
                PathBuf::from("assets/tilesets/TileSet_1.png"),
                PathBuf::from("assets/tiles/TileSet_1.png"),
                PathBuf::from("assets/TileSet_1.png"),
                PathBuf::from("../../tilesets/TileSet_1.png"),
            ]
        );
    }

    #[test]
    fn plain_references_skip_asset_dirs() {
        let r = FileResolver::new("assets");
        let got = r.candidates("floor.png", Path::new("maps"));
        assert_eq!(
            got,
            vec![
                PathBuf::from("maps/floor.png"),
                PathBuf::from("assets/floor.png"),
                PathBuf::from("floor.png"),
            ]
        );
    }

    #[test]
    fn missing_file_yields_placeholder() {
        let r = FileResolver::new("/definitely/not/here").with_placeholder(16, 4);
        let img = r.resolve("nope.png", Path::new("/definitely/not/here/maps"));
        assert_eq!((img.width, img.height), (16, 16));
        assert_eq!(img.bytes, placeholder_image(16, 4).bytes);
    }

    #[test]
    fn undecodable_file_yields_placeholder() {
        let dir = std::env::temp_dir().join(format!(
            "tiled_arena_resource_{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock went backwards")
                .as_nanos()
        ));
        fs::create_dir_all(&dir).expect("temp dir");
        fs::write(dir.join("garbage.png"), b"not a png").expect("write");

        let img = FileResolver::new(&dir).resolve("garbage.png", &dir);
        assert_eq!(img.bytes, placeholder_image(32, 8).bytes);
    }
}
