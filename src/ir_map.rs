// src/ir_map.rs
use macroquad::prelude::*;
use std::collections::HashMap;

/// Canonical, format-agnostic map.
#[derive(Debug, Clone)]
pub struct IrMap {
    /// Columns of the tile grid.
    pub width: u32,
    /// Rows of the tile grid.
    pub height: u32,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Map-level custom properties.
    pub properties: Properties,
    /// Tilesets, sorted by first gid.
    pub tilesets: Vec<IrTileset>,
    /// Layers in draw order.
    pub layers: Vec<IrLayer>,
}

impl IrMap {
    /// Map width in pixels, saturating at `u32::MAX`.
    pub fn pixel_width(&self) -> u32 {
        self.width.saturating_mul(self.tile_w)
    }

    /// Map height in pixels, saturating at `u32::MAX`.
    pub fn pixel_height(&self) -> u32 {
        self.height.saturating_mul(self.tile_h)
    }

    /// Finds the tileset owning `gid` (flip flags already stripped) and the
    /// tile's local id within it.
    pub fn tileset_for_gid(&self, gid: u32) -> Option<(&IrTileset, u32)> {
        if gid == 0 {
            return None;
        }
        self.tilesets
            .iter()
            .rev()
            .find(|ts| ts.first_gid() <= gid)
            .filter(|ts| gid - ts.first_gid() < ts.tilecount())
            .map(|ts| (ts, gid - ts.first_gid()))
    }

    /// Custom properties attached to the tile `gid`, if any.
    pub fn tile_properties(&self, gid: u32) -> Option<&Properties> {
        let (ts, local) = self.tileset_for_gid(gid)?;
        ts.tile(local).map(|t| &t.properties)
    }

    /// Iterates every object layer as `(layer, objects)`.
    pub fn object_groups(&self) -> impl Iterator<Item = (&IrLayer, &[IrObject])> {
        self.layers.iter().filter_map(|l| match &l.kind {
            IrLayerKind::Objects { objects } => Some((l, objects.as_slice())),
            _ => None,
        })
    }
}

/// Tileset referenced by a map.
#[derive(Debug, Clone)]
pub enum IrTileset {
    /// One image atlas with a regular grid.
    Atlas {
        /// First gid of the tileset.
        first_gid: u32,
        /// Atlas image reference.
        image: String,
        /// Tile width in pixels.
        tile_w: u32,
        /// Tile height in pixels.
        tile_h: u32,
        /// Number of tiles.
        tilecount: u32,
        /// Tiles per atlas row.
        columns: u32,
        /// Pixels between tiles.
        spacing: u32,
        /// Pixels around the atlas edge.
        margin: u32,
        /// Tileset properties.
        properties: Properties,
        /// Per-tile metadata.
        tiles: Vec<IrTileMetadata>,
    },
    /// Image collection: every tile references its own image.
    Collection {
        /// First gid of the tileset.
        first_gid: u32,
        /// One past the highest local id.
        tilecount: u32,
        /// Tileset properties.
        properties: Properties,
        /// Per-tile metadata, including each tile's image.
        tiles: Vec<IrTileMetadata>,
    },
}

impl IrTileset {
    /// First global tile id covered by this tileset.
    pub fn first_gid(&self) -> u32 {
        match self {
            IrTileset::Atlas { first_gid, .. } | IrTileset::Collection { first_gid, .. } => {
                *first_gid
            }
        }
    }

    /// Number of tiles, including gaps in image collections.
    pub fn tilecount(&self) -> u32 {
        match self {
            IrTileset::Atlas { tilecount, .. } | IrTileset::Collection { tilecount, .. } => {
                *tilecount
            }
        }
    }

    /// Per-tile metadata entries.
    pub fn tiles(&self) -> &[IrTileMetadata] {
        match self {
            IrTileset::Atlas { tiles, .. } | IrTileset::Collection { tiles, .. } => tiles,
        }
    }

    /// Metadata of the tile with local id `local`.
    pub fn tile(&self, local: u32) -> Option<&IrTileMetadata> {
        self.tiles().iter().find(|t| t.id == local)
    }
}

/// Per-tile metadata from a tileset's `tiles` array.
#[derive(Debug, Clone, Default)]
pub struct IrTileMetadata {
    /// Local tile id.
    pub id: u32,
    /// Image reference, only used by image-collection tilesets.
    pub image: Option<String>,
    /// Custom properties of the tile.
    pub properties: Properties,
}

/// Content of a layer, decided at decode time.
#[derive(Debug, Clone)]
pub enum IrLayerKind {
    /// Tile grid of raw gids, row-major.
    Tiles {
        /// Columns.
        width: usize,
        /// Rows.
        height: usize,
        /// Raw gids, flip flags included.
        data: Vec<u32>,
    },
    /// Free-form objects.
    Objects {
        /// Objects in authoring order.
        objects: Vec<IrObject>,
    },
    /// Image and group layers; decoded but ignored.
    Unsupported,
}

/// One layer of the map, in draw order.
#[derive(Debug, Clone)]
pub struct IrLayer {
    /// Layer name as authored.
    pub name: String,
    /// Hidden layers are neither drawn nor scanned for collisions.
    pub visible: bool,
    /// Layer opacity in `0..=1`.
    pub opacity: f32,
    /// World offset applied when drawing.
    pub offset: Vec2,
    /// Custom properties of the layer.
    pub properties: Properties,
    /// Tiles, objects or an ignored layer type.
    pub kind: IrLayerKind,
}

/// A free-form object from an object layer.
#[derive(Debug, Clone)]
pub struct IrObject {
    /// Tiled object id.
    pub id: u32,
    /// Object name; may be empty.
    pub name: String,
    /// Tiled `class`, or the legacy `type` field when `class` is empty.
    pub class_name: String,
    /// Left edge, or the anchor point for points and polygons.
    pub x: f32,
    /// Top edge, or the bottom edge for tile objects.
    pub y: f32,
    /// Width in pixels; zero for points, polygons and polylines.
    pub width: f32,
    /// Height in pixels; zero for points, polygons and polylines.
    pub height: f32,
    /// Clockwise rotation in degrees.
    pub rotation: f32,
    /// Visibility flag from the editor.
    pub visible: bool,
    /// Geometry kind.
    pub shape: IrObjectShape,
    /// Custom properties of the object.
    pub properties: Properties,
}

impl IrObject {
    /// World-space bounding rectangle.
    ///
    /// Polygons and polylines are bounded by their points (relative to
    /// `x, y`); tile objects are anchored at their bottom-left corner.
    pub fn rect(&self) -> Rect {
        match &self.shape {
            IrObjectShape::Polygon(points) | IrObjectShape::Polyline(points)
                if !points.is_empty() =>
            {
                let (min, max) = points.iter().fold(
                    (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
                    |(min, max), p| (min.min(*p), max.max(*p)),
                );
                Rect::new(self.x + min.x, self.y + min.y, max.x - min.x, max.y - min.y)
            }
            IrObjectShape::Tile { .. } => {
                Rect::new(self.x, self.y - self.height, self.width, self.height)
            }
            _ => Rect::new(self.x, self.y, self.width, self.height),
        }
    }

    /// Anchor position (top-left for rectangles, the point itself for points).
    pub fn position(&self) -> Vec2 {
        vec2(self.x, self.y)
    }
}

/// Geometry of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum IrObjectShape {
    /// Axis-aligned rectangle.
    Rectangle,
    /// Single point at `x, y`.
    Point,
    /// Ellipse inscribed in the bounding box.
    Ellipse,
    /// Closed polygon, points relative to the object position.
    Polygon(Vec<Vec2>),
    /// Open polyline, points relative to the object position.
    Polyline(Vec<Vec2>),
    /// Tile drawn as an object.
    Tile {
        /// Raw gid, flip flags included.
        gid: u32,
    },
}

/// Typed custom property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `bool` property.
    Bool(bool),
    /// `int` or `object` property.
    I64(i64),
    /// `float` property.
    F32(f32),
    /// `string`, `file`, `color` or `class` property.
    String(String),
}

/// Custom property bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    /// Empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a property.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    /// Raw value of a property.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when there are no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Boolean property, if present with that type.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer property, if present with that type.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer property that fits in `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// Float property; integers are widened.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            PropertyValue::F32(v) => Some(*v),
            PropertyValue::I64(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// String property, if present with that type.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas(first_gid: u32, tilecount: u32, tiles: Vec<IrTileMetadata>) -> IrTileset {
        IrTileset::Atlas {
            first_gid,
            image: "tiles.png".into(),
            tile_w: 16,
            tile_h: 16,
            tilecount,
            columns: 4,
            spacing: 0,
            margin: 0,
            properties: Properties::new(),
            tiles,
        }
    }

    #[test]
    fn tileset_lookup_respects_ranges() {
        let mut solid = Properties::new();
        solid.insert("collides", PropertyValue::Bool(true));
        let map = IrMap {
            width: 1,
            height: 1,
            tile_w: 16,
            tile_h: 16,
            properties: Properties::new(),
            tilesets: vec![
                atlas(1, 4, vec![]),
                atlas(
                    10,
                    2,
                    vec![IrTileMetadata {
                        id: 1,
                        image: None,
                        properties: solid,
                    }],
                ),
            ],
            layers: vec![],
        };

        assert!(map.tileset_for_gid(0).is_none());
        assert_eq!(map.tileset_for_gid(4).map(|(_, l)| l), Some(3));
        assert!(map.tileset_for_gid(5).is_none());
        assert_eq!(map.tileset_for_gid(11).map(|(_, l)| l), Some(1));
        assert!(map.tileset_for_gid(12).is_none());
        assert_eq!(
            map.tile_properties(11).and_then(|p| p.get_bool("collides")),
            Some(true)
        );
        assert!(map.tile_properties(10).is_none());
    }

    #[test]
    fn i32_accessor_rejects_overflow() {
        let mut props = Properties::new();
        props.insert("big", PropertyValue::I64(5_000_000_000));
        assert_eq!(props.get_i64("big"), Some(5_000_000_000));
        assert_eq!(props.get_i32("big"), None);
        assert_eq!(props.get_bool("big"), None);
    }

    fn shaped(x: f32, y: f32, width: f32, height: f32, shape: IrObjectShape) -> IrObject {
        IrObject {
            id: 1,
            name: String::new(),
            class_name: String::new(),
            x,
            y,
            width,
            height,
            rotation: 0.0,
            visible: true,
            shape,
            properties: Properties::new(),
        }
    }

    #[test]
    fn object_bounds_follow_shape() {
        let poly = shaped(
            100.0,
            50.0,
            0.0,
            0.0,
            IrObjectShape::Polyline(vec![vec2(0.0, 0.0), vec2(-20.0, 30.0), vec2(40.0, 10.0)]),
        );
        assert_eq!(poly.rect(), Rect::new(80.0, 50.0, 60.0, 30.0));

        let tile = shaped(10.0, 64.0, 32.0, 32.0, IrObjectShape::Tile { gid: 3 });
        assert_eq!(tile.rect(), Rect::new(10.0, 32.0, 32.0, 32.0));

        let empty = shaped(5.0, 6.0, 0.0, 0.0, IrObjectShape::Polygon(vec![]));
        assert_eq!(empty.rect(), Rect::new(5.0, 6.0, 0.0, 0.0));
    }
}
