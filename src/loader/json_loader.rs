// src/loader/json_loader.rs
//! Tiled JSON to [`IrMap`].
use crate::error::LoadError;
use crate::ir_map::*;
use crate::spatial::GID_MASK;
use macroquad::prelude::*;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" / "objectgroup"
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    objects: Vec<JsonObject>,
}

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    embedded: JsonTileset,
}

#[derive(Deserialize)]
struct JsonMap {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetRef>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize, Default)]
struct JsonTileset {
    #[serde(default)]
    tilewidth: u32,
    #[serde(default)]
    tileheight: u32,
    #[serde(default)]
    tilecount: u32,
    #[serde(default)]
    columns: u32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    point: bool,
    #[serde(default)]
    ellipse: bool,
    #[serde(default)]
    polygon: Vec<JsonObjectPoint>,
    #[serde(default)]
    polyline: Vec<JsonObjectPoint>,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonObjectPoint {
    x: f32,
    y: f32,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

fn json_property_to_ir(prop: JsonProperty) -> Result<Option<(String, PropertyValue)>, LoadError> {
    let JsonProperty { name, kind, value } = prop;

    let parsed = match kind.as_deref() {
        Some("bool") => value.as_bool().map(PropertyValue::Bool),
        Some("int") | Some("object") => value.as_i64().map(PropertyValue::I64),
        Some("float") => value.as_f64().map(|n| PropertyValue::F32(n as f32)),
        Some("string") | Some("file") | Some("color") | Some("class") => {
            value.as_str().map(|s| PropertyValue::String(s.to_owned()))
        }
        Some(other) => {
            return Err(LoadError::UnsupportedPropertyType {
                name,
                kind: other.to_owned(),
            });
        }
        None => {
            if let Some(v) = value.as_bool() {
                Some(PropertyValue::Bool(v))
            } else if let Some(v) = value.as_i64() {
                Some(PropertyValue::I64(v))
            } else if let Some(v) = value.as_f64() {
                Some(PropertyValue::F32(v as f32))
            } else {
                value.as_str().map(|s| PropertyValue::String(s.to_owned()))
            }
        }
    };

    Ok(parsed.map(|value| (name, value)))
}

fn properties_from_json(props: Vec<JsonProperty>) -> Result<Properties, LoadError> {
    let mut out = Properties::new();
    for p in props {
        if let Some((name, value)) = json_property_to_ir(p)? {
            out.insert(name, value);
        }
    }
    Ok(out)
}

fn object_to_ir(obj: JsonObject) -> Result<IrObject, LoadError> {
    let shape = if let Some(gid) = obj.gid {
        IrObjectShape::Tile { gid }
    } else if obj.point {
        IrObjectShape::Point
    } else if obj.ellipse {
        IrObjectShape::Ellipse
    } else if !obj.polygon.is_empty() {
        IrObjectShape::Polygon(obj.polygon.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else if !obj.polyline.is_empty() {
        IrObjectShape::Polyline(obj.polyline.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else {
        IrObjectShape::Rectangle
    };

    let class_name = if !obj.class.is_empty() {
        obj.class
    } else {
        obj.kind
    };

    Ok(IrObject {
        id: obj.id,
        name: obj.name,
        class_name,
        x: obj.x,
        y: obj.y,
        width: obj.width,
        height: obj.height,
        rotation: obj.rotation,
        visible: obj.visible,
        shape,
        properties: properties_from_json(obj.properties)?,
    })
}

fn tiles_to_ir(tiles: Vec<JsonTile>) -> Result<Vec<IrTileMetadata>, LoadError> {
    tiles
        .into_iter()
        .map(|tile| {
            Ok(IrTileMetadata {
                id: tile.id,
                image: tile.image,
                properties: properties_from_json(tile.properties)?,
            })
        })
        .collect()
}

fn tileset_to_ir(first_gid: u32, ts: JsonTileset, origin: &str) -> Result<IrTileset, LoadError> {
    let properties = properties_from_json(ts.properties)?;
    let tiles = tiles_to_ir(ts.tiles)?;

    match ts.image {
        Some(image) => {
            if ts.columns == 0 || ts.tilewidth == 0 || ts.tileheight == 0 {
                return Err(LoadError::InvalidMap(format!(
                    "Atlas tileset {origin} needs columns and tile size"
                )));
            }
            Ok(IrTileset::Atlas {
                first_gid,
                image,
                tile_w: ts.tilewidth,
                tile_h: ts.tileheight,
                tilecount: ts.tilecount,
                columns: ts.columns,
                spacing: ts.spacing,
                margin: ts.margin,
                properties,
                tiles,
            })
        }
        None => {
            // Collections may leave gaps in ids; cover the highest one.
            let tilecount = tiles
                .iter()
                .map(|t| t.id.saturating_add(1))
                .max()
                .unwrap_or(0)
                .max(ts.tilecount);
            Ok(IrTileset::Collection {
                first_gid,
                tilecount,
                properties,
                tiles,
            })
        }
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, LoadError> {
    let txt = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&txt).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Decodes a Tiled JSON map file. Returns the map and the directory that
/// relative asset references resolve against.
pub fn decode_map_file_to_ir(path: &Path) -> Result<(IrMap, PathBuf), LoadError> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(LoadError::UnsupportedFormat(path.display().to_string()));
    }

    let j: JsonMap = read_json(path)?;

    let map_dir = path
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));

    let ir = json_map_to_ir(j, &map_dir)?;
    Ok((ir, map_dir))
}

/// Decodes a Tiled JSON map held in memory. External tilesets are resolved
/// relative to `map_dir`.
pub fn decode_map_str_to_ir(json: &str, map_dir: &Path) -> Result<IrMap, LoadError> {
    let j: JsonMap = serde_json::from_str(json).map_err(|source| LoadError::Json {
        path: map_dir.join("<inline>"),
        source,
    })?;
    json_map_to_ir(j, map_dir)
}

fn json_map_to_ir(j: JsonMap, map_dir: &Path) -> Result<IrMap, LoadError> {
    if j.tilewidth == 0 || j.tileheight == 0 {
        return Err(LoadError::InvalidMap("Tile size must be non-zero".into()));
    }

    // Build IR tilesets
    let mut ir_tilesets = Vec::with_capacity(j.tilesets.len());
    for ts in j.tilesets {
        let tileset = match ts.source {
            Some(source) => {
                if !source.ends_with(".json") {
                    return Err(LoadError::InvalidMap(format!(
                        "External tileset must be JSON: {source}"
                    )));
                }
                let ext: JsonTileset = read_json(&map_dir.join(&source))?;
                tileset_to_ir(ts.firstgid, ext, &source)?
            }
            None => tileset_to_ir(ts.firstgid, ts.embedded, "<embedded>")?,
        };
        ir_tilesets.push(tileset);
    }

    // Sort by first_gid to make gid lookup a reverse scan
    ir_tilesets.sort_by_key(IrTileset::first_gid);

    let max_gid = ir_tilesets
        .iter()
        .map(|t| t.first_gid().saturating_add(t.tilecount().saturating_sub(1)))
        .max()
        .unwrap_or(0);

    // Build IR layers
    let mut grid_w = j.width;
    let mut grid_h = j.height;
    let mut ir_layers = Vec::with_capacity(j.layers.len());
    for l in j.layers {
        let properties = properties_from_json(l.properties)?;
        let layer_kind = match l.kind.as_deref().unwrap_or("tilelayer") {
            "tilelayer" => {
                let expected = l.width.checked_mul(l.height).ok_or_else(|| {
                    LoadError::InvalidMap(format!(
                        "Layer '{}' is {}x{} cells",
                        l.name, l.width, l.height
                    ))
                })?;
                if l.data.len() != expected {
                    return Err(LoadError::InvalidLayerSize {
                        layer: l.name,
                        expected,
                        found: l.data.len(),
                    });
                }
                let unknown = l
                    .data
                    .iter()
                    .map(|raw| raw & GID_MASK)
                    .filter(|&gid| gid > max_gid)
                    .count();
                if unknown > 0 {
                    tracing::warn!(
                        layer = %l.name,
                        unknown,
                        max_gid,
                        "tile layer references gids outside every tileset; they will be walkable and not drawn"
                    );
                }
                let (Ok(lw), Ok(lh)) = (u32::try_from(l.width), u32::try_from(l.height)) else {
                    return Err(LoadError::InvalidMap(format!(
                        "Layer '{}' is {}x{} cells",
                        l.name, l.width, l.height
                    )));
                };
                grid_w = grid_w.max(lw);
                grid_h = grid_h.max(lh);
                IrLayerKind::Tiles {
                    width: l.width,
                    height: l.height,
                    data: l.data,
                }
            }
            "objectgroup" => IrLayerKind::Objects {
                objects: l
                    .objects
                    .into_iter()
                    .map(object_to_ir)
                    .collect::<Result<Vec<_>, _>>()?,
            },
            other => {
                tracing::debug!(layer = %l.name, kind = other, "skipping unsupported layer");
                IrLayerKind::Unsupported
            }
        };
        ir_layers.push(IrLayer {
            name: l.name,
            visible: l.visible,
            opacity: l.opacity,
            offset: vec2(l.offsetx, l.offsety),
            properties,
            kind: layer_kind,
        });
    }

    if grid_w == 0 || grid_h == 0 {
        return Err(LoadError::InvalidMap(
            "Map dimensions must be non-zero".into(),
        ));
    }
    if grid_w.checked_mul(j.tilewidth).is_none() || grid_h.checked_mul(j.tileheight).is_none() {
        return Err(LoadError::MapTooLarge {
            width: grid_w.saturating_mul(j.tilewidth),
            height: grid_h.saturating_mul(j.tileheight),
            max: u32::MAX,
        });
    }

    Ok(IrMap {
        width: grid_w,
        height: grid_h,
        tile_w: j.tilewidth,
        tile_h: j.tileheight,
        properties: properties_from_json(j.properties)?,
        tilesets: ir_tilesets,
        layers: ir_layers,
    })
}
