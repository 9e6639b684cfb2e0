use macroquad::prelude::*;
use tiled_arena::{EngineConfig, MapLoadContext, TileMap, CUSTOMER_SPAWN};

fn window_conf() -> Conf {
    Conf {
        window_title: "Basic Map".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = match EngineConfig::from_path("assets/engine.toml") {
        Ok(config) => config,
        Err(err) => {
            eprintln!("using default engine config: {err:#}");
            EngineConfig::default()
        }
    };
    let ctx = MapLoadContext::new("assets/map.json", "assets")
        .with_search_dir("assets/maps")
        .with_config(config);
    let map = TileMap::load(&ctx);

    println!("fallback={}", map.is_fallback());
    println!("customer_spawns={:?}", map.spawn_positions(CUSTOMER_SPAWN));

    let mut debug = false;
    loop {
        clear_background(BLACK);
        if is_key_pressed(KeyCode::F1) {
            debug = !debug;
        }

        map.draw_screen();
        if debug {
            map.draw_debug_walkable(16);
            map.draw_debug_spawn_points();
        }

        draw_text(
            &format!("FPS: {}", get_fps()),
            screen_width() - 135.0,
            55.0,
            30.0,
            RED,
        );

        next_frame().await;
    }
}
