// tests/load_tests.rs

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use macroquad::prelude::*;
use tiled_arena::render::{blank_image, pixel};
use tiled_arena::{
    EngineConfig, LoadError, MapLoadContext, MapSource, MapState, PlaceholderResolver, TileCoord,
    TileMap,
};

fn temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("tiled_arena_{tag}_{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn load(tag: &str, json: &str) -> TileMap {
    let dir = temp_dir(tag);
    let path = dir.join("level.json");
    fs::write(&path, json).expect("failed to write map");
    let ctx = MapLoadContext::new(&path, &dir).with_resolver(PlaceholderResolver);
    TileMap::try_load(&ctx).expect("map should load")
}

const RECT_MAP: &str = r#"{
  "width": 20, "height": 15, "tilewidth": 32, "tileheight": 32,
  "layers": [
    {"type":"tilelayer","name":"ground","width":20,"height":15,"data":[]},
    {"type":"objectgroup","name":"Collision","objects":[
      {"id":1,"x":100,"y":100,"width":64,"height":64}
    ]}
  ],
  "tilesets": []
}"#;

#[test]
fn collision_rectangle_blocks_its_interior() {
    // empty data arrays are rejected, so fill the ground layer
    let json = RECT_MAP.replace("\"data\":[]", &format!("\"data\":{:?}", vec![0; 300]));
    let map = load("rect", &json);

    assert_eq!(map.state(), MapState::Ready);
    assert!(!map.is_fallback());
    assert_eq!(map.collisions().rects.len(), 1);
    assert!(!map.is_walkable(132.0, 132.0));
    assert!(map.is_walkable(10.0, 10.0));
    assert!(!map.is_walkable(640.0, 10.0));
    assert!(!map.is_walkable(f32::NAN, 10.0));
}

#[test]
fn legacy_layers_and_collides_tiles_block_cells() {
    let json = r#"{
      "width": 3, "height": 2, "tilewidth": 32, "tileheight": 32,
      "layers": [
        {"type":"tilelayer","name":"Ground","width":3,"height":2,"data":[1,2,1,1,1,1]},
        {"type":"tilelayer","name":"OCEAN","width":3,"height":2,"data":[0,0,0,0,0,1]},
        {"type":"tilelayer","name":"hidden","visible":false,"width":3,"height":2,"data":[2,2,2,2,2,2]}
      ],
      "tilesets": [{
        "firstgid": 1, "tilewidth": 32, "tileheight": 32, "tilecount": 2, "columns": 2,
        "image": "terrain.png",
        "tiles": [{"id": 1, "properties": [{"name":"collides","type":"bool","value":true}]}]
      }]
    }"#;
    let map = load("legacy", json);

    let blocked = &map.collisions().blocked_tiles;
    assert_eq!(blocked.len(), 2);
    assert!(blocked.contains(&TileCoord::new(1, 0)));
    assert!(blocked.contains(&TileCoord::new(2, 1)));
    assert!(!map.compute_walkable(48.0, 16.0));
    assert!(map.compute_walkable(16.0, 16.0));
}

#[test]
fn unknown_gids_are_walkable() {
    let json = r#"{
      "width": 2, "height": 1, "tilewidth": 32, "tileheight": 32,
      "layers": [{"type":"tilelayer","name":"floor","width":2,"height":1,"data":[99,0]}],
      "tilesets": []
    }"#;
    let map = load("unknown_gid", json);
    assert!(map.collisions().is_empty());
    assert!(map.compute_walkable(16.0, 16.0));
}

#[test]
fn missing_map_yields_a_drawable_fallback() {
    let dir = temp_dir("missing");
    let ctx = MapLoadContext::new(dir.join("nope.json"), &dir).with_resolver(PlaceholderResolver);

    let map = TileMap::load(&ctx);
    assert_eq!(map.state(), MapState::Ready);
    assert!(matches!(map.source(), MapSource::Fallback { .. }));

    let mut canvas = blank_image(map.pixel_width(), map.pixel_height());
    map.draw(&mut canvas);
    assert_eq!(pixel(&canvas, 5, 5), [100, 100, 100, 255]);
}

#[test]
fn malformed_json_falls_back_and_reports_the_cause() {
    let dir = temp_dir("malformed");
    let path = dir.join("broken.json");
    fs::write(&path, "{ not json").expect("write");
    let ctx = MapLoadContext::new(&path, &dir).with_resolver(PlaceholderResolver);

    assert!(matches!(TileMap::try_load(&ctx), Err(LoadError::Json { .. })));
    assert!(TileMap::load(&ctx).is_fallback());
}

#[test]
fn oversized_maps_fall_back_instead_of_panicking() {
    let dir = temp_dir("oversized");
    let path = dir.join("huge.json");
    fs::write(
        &path,
        r#"{"width": 65536, "height": 1, "tilewidth": 65536, "tileheight": 32, "layers": []}"#,
    )
    .expect("write");
    let ctx = MapLoadContext::new(&path, &dir).with_resolver(PlaceholderResolver);

    assert!(matches!(TileMap::try_load(&ctx), Err(LoadError::MapTooLarge { .. })));
    let map = TileMap::load(&ctx);
    assert!(map.is_fallback());
    assert_eq!((map.pixel_width(), map.pixel_height()), (640, 480));
}

#[test]
fn tmx_maps_are_unsupported() {
    let dir = temp_dir("tmx");
    let path = dir.join("level.tmx");
    fs::write(&path, "<map/>").expect("write");
    let ctx = MapLoadContext::new(&path, &dir);

    match TileMap::try_load(&ctx) {
        Err(LoadError::UnsupportedFormat(name)) => assert!(name.ends_with("level.tmx")),
        Err(other) => panic!("expected UnsupportedFormat, got {other:?}"),
        Ok(_) => panic!("tmx should not load"),
    }
}

#[test]
fn config_file_drives_the_fallback_arena() -> anyhow::Result<()> {
    let dir = temp_dir("config");
    let cfg_path = dir.join("engine.toml");
    fs::write(
        &cfg_path,
        "cache_step = 4\n[fallback]\nwidth = 320\nheight = 320\ntile_size = 32\n",
    )?;
    let config = EngineConfig::from_path(&cfg_path)?;

    let ctx = MapLoadContext::new(dir.join("absent.json"), &dir)
        .with_resolver(PlaceholderResolver)
        .with_config(config);
    let map = TileMap::load(&ctx);

    assert_eq!((map.pixel_width(), map.pixel_height()), (320, 320));
    assert_eq!(map.walkability().step(), 4);
    assert!(map.is_walkable(160.0, 160.0));
    Ok(())
}

#[test]
fn walkability_queries_are_stable() {
    let json = RECT_MAP.replace("\"data\":[]", &format!("\"data\":{:?}", vec![0; 300]));
    let map = load("stable", &json);

    for (x, y) in [(10.0, 10.0), (132.0, 132.0), (500.5, 300.25), (-1.0, 5.0)] {
        let first = map.is_walkable(x, y);
        assert_eq!(first, map.is_walkable(x, y), "({x}, {y})");
        assert_eq!(first, map.is_walkable(x, y), "({x}, {y})");
    }
    assert!(map.bounds().contains(vec2(639.0, 479.0)));
}
