use std::path::{Path, PathBuf};
use std::rc::Rc;

use macroquad::prelude::*;

use crate::collision::{self, CollisionSet};
use crate::config::EngineConfig;
use crate::error::LoadError;
use crate::fallback;
use crate::ir_map::IrMap;
use crate::loader::context::MapLoadContext;
use crate::loader::json_loader::decode_map_file_to_ir;
use crate::render::{self, debug, Composite, DrawTarget, ScreenTarget};
use crate::resource::ResourceResolver;
use crate::spatial::{MapBounds, WalkabilityCache};
use crate::spawn::{EdgeScan, SpawnCatalog, SpawnResolver, SpawnTier};

/// Load progress of a [`TileMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    /// Nothing loaded yet.
    Unloaded,
    /// Decoding the authored map.
    Loading,
    /// The authored map failed and the generated arena is being built.
    Fallback,
    /// Queryable and drawable.
    Ready,
}

/// Where a map's content came from.
#[derive(Debug, Clone, PartialEq)]
pub enum MapSource {
    /// Decoded from this file.
    Authored(PathBuf),
    /// Generated because the authored map could not be loaded.
    Fallback {
        /// Why the authored map was not used.
        reason: String,
    },
}

#[derive(Debug, Default)]
struct Lifecycle(Vec<MapState>);

impl Lifecycle {
    fn start() -> Self {
        let mut l = Self(Vec::with_capacity(4));
        l.advance(MapState::Unloaded);
        l
    }

    fn advance(&mut self, next: MapState) {
        tracing::debug!(from = ?self.0.last(), to = ?next, "map state");
        self.0.push(next);
    }
}

/// A loaded level: collision geometry, walkability cache, spawn catalog and
/// a pre-rendered image.
///
/// Only reachable in the `Ready` state. Apart from the walkability cache's
/// memoization nothing changes after construction; a new level is a new
/// `TileMap`.
pub struct TileMap {
    ir: IrMap,
    source: MapSource,
    lifecycle: Lifecycle,
    bounds: MapBounds,
    collisions: Rc<CollisionSet>,
    walkability: WalkabilityCache,
    catalog: SpawnCatalog,
    composite: Composite,
    edge: EdgeScan,
}

impl TileMap {
    /// Loads the map described by `ctx`, falling back to the generated arena
    /// on any [`LoadError`]. Never fails.
    pub fn load(ctx: &MapLoadContext) -> Self {
        let mut lifecycle = Lifecycle::start();
        lifecycle.advance(MapState::Loading);

        match Self::build_authored(ctx) {
            Ok(mut map) => {
                lifecycle.advance(MapState::Ready);
                map.lifecycle = lifecycle;
                map
            }
            Err(err) => {
                tracing::warn!(
                    path = %ctx.map_path().display(),
                    error = %err,
                    "failed to load map; using fallback arena"
                );
                lifecycle.advance(MapState::Fallback);
                let mut map = Self::build_fallback(ctx.config(), err.to_string());
                lifecycle.advance(MapState::Ready);
                map.lifecycle = lifecycle;
                map
            }
        }
    }

    /// Loads the authored map only, reporting why it could not be loaded.
    pub fn try_load(ctx: &MapLoadContext) -> Result<Self, LoadError> {
        let mut lifecycle = Lifecycle::start();
        lifecycle.advance(MapState::Loading);
        let mut map = Self::build_authored(ctx)?;
        lifecycle.advance(MapState::Ready);
        map.lifecycle = lifecycle;
        Ok(map)
    }

    /// The generated arena, without touching the filesystem.
    pub fn fallback(config: &EngineConfig) -> Self {
        let mut lifecycle = Lifecycle::start();
        lifecycle.advance(MapState::Fallback);
        let mut map = Self::build_fallback(config, "requested".to_owned());
        lifecycle.advance(MapState::Ready);
        map.lifecycle = lifecycle;
        map
    }

    /// Builds a map from already decoded data. `base` is the directory tile
    /// image references resolve against.
    pub fn from_ir(
        ir: IrMap,
        base: &Path,
        resolver: &dyn ResourceResolver,
        config: &EngineConfig,
    ) -> Result<Self, LoadError> {
        let (px_w, px_h) = (ir.pixel_width(), ir.pixel_height());
        let max = u16::MAX as u32;
        if px_w > max || px_h > max {
            return Err(LoadError::MapTooLarge {
                width: px_w,
                height: px_h,
                max,
            });
        }

        let collisions = collision::extract(&ir);
        let catalog = SpawnCatalog::from_map(&ir);
        let image = render::compose(&ir, base, resolver, config.placeholder_cell);
        let source = MapSource::Authored(base.to_path_buf());
        Ok(Self::assemble(ir, source, collisions, catalog, image, config))
    }

    fn build_authored(ctx: &MapLoadContext) -> Result<Self, LoadError> {
        let path = ctx.locate_map().ok_or_else(|| LoadError::Io {
            path: ctx.map_path().to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "map file not found"),
        })?;
        let (ir, base) = decode_map_file_to_ir(&path)?;
        let mut map = Self::from_ir(ir, &base, ctx.resolver(), ctx.config())?;
        tracing::info!(
            path = %path.display(),
            width = map.ir.width,
            height = map.ir.height,
            spawn_categories = map.catalog.len(),
            "map loaded"
        );
        map.source = MapSource::Authored(path);
        Ok(map)
    }

    fn build_fallback(config: &EngineConfig, reason: String) -> Self {
        let generated = fallback::generate(&config.fallback);
        Self::assemble(
            generated.ir,
            MapSource::Fallback { reason },
            generated.collisions,
            generated.catalog,
            generated.image,
            config,
        )
    }

    fn assemble(
        ir: IrMap,
        source: MapSource,
        collisions: CollisionSet,
        catalog: SpawnCatalog,
        image: Image,
        config: &EngineConfig,
    ) -> Self {
        let bounds = MapBounds::new(ir.pixel_width(), ir.pixel_height(), ir.tile_w, ir.tile_h);
        let collisions = Rc::new(collisions);
        let walkability = WalkabilityCache::new(
            Rc::clone(&collisions),
            bounds,
            config.cache_step,
            config.probe_half_extent,
            config.eager_cell_limit,
        );
        Self {
            ir,
            source,
            lifecycle: Lifecycle::default(),
            bounds,
            collisions,
            walkability,
            catalog,
            composite: Composite::new(image),
            edge: EdgeScan {
                margin: config.spawn_edge_margin,
                step: config.spawn_edge_step,
            },
        }
    }

    /// Cached walkability of a world point. Out-of-bounds and non-finite
    /// points are never walkable.
    pub fn is_walkable(&self, x: f32, y: f32) -> bool {
        self.walkability.is_walkable(x, y)
    }

    /// Walkability computed directly from the collision geometry.
    pub fn compute_walkable(&self, x: f32, y: f32) -> bool {
        self.walkability.compute_walkable(x, y)
    }

    /// Spawn points for `category`. Never empty.
    pub fn spawn_positions(&self, category: &str) -> Vec<Vec2> {
        self.spawn_resolver().resolve(category)
    }

    /// Like [`TileMap::spawn_positions`], also reporting which tier answered.
    pub fn spawn_positions_with_tier(&self, category: &str) -> (Vec<Vec2>, SpawnTier) {
        self.spawn_resolver().resolve_with_tier(category)
    }

    fn spawn_resolver(&self) -> SpawnResolver<'_> {
        SpawnResolver::new(
            &self.catalog,
            &self.ir,
            &self.walkability,
            self.bounds,
            self.edge,
        )
    }

    /// Draws the whole map with its top-left corner at the origin.
    pub fn draw(&self, target: &mut impl DrawTarget) {
        let full = Rect::new(
            0.0,
            0.0,
            self.composite.width() as f32,
            self.composite.height() as f32,
        );
        target.blit(&self.composite, full, Vec2::ZERO);
    }

    /// Draws only the part of the map inside the view rectangle.
    pub fn draw_visible_rect(&self, target: &mut impl DrawTarget, view_min: Vec2, view_max: Vec2) {
        if let Some(region) = render::visible_region(
            view_min,
            view_max,
            self.composite.width(),
            self.composite.height(),
        ) {
            target.blit(&self.composite, region, region.point());
        }
    }

    /// Draws the whole map to the macroquad screen.
    pub fn draw_screen(&self) {
        self.draw(&mut ScreenTarget);
    }

    /// Overlays walkability samples every `grid` pixels.
    pub fn draw_debug_walkable(&self, grid: u32) {
        let samples = debug::walkability_samples(&self.walkability, self.bounds, grid);
        debug::draw_walkability(&samples);
    }

    /// Marks every cataloged spawn point.
    pub fn draw_debug_spawn_points(&self) {
        debug::draw_spawn_points(&self.catalog);
    }

    /// Always [`MapState::Ready`] for a constructed map.
    pub fn state(&self) -> MapState {
        self.lifecycle.0.last().copied().unwrap_or(MapState::Ready)
    }

    /// States this map went through while loading.
    pub fn lifecycle(&self) -> &[MapState] {
        &self.lifecycle.0
    }

    /// `true` when the generated arena replaced the authored map.
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, MapSource::Fallback { .. })
    }

    /// Where the content came from.
    pub fn source(&self) -> &MapSource {
        &self.source
    }

    /// Decoded map data.
    pub fn ir(&self) -> &IrMap {
        &self.ir
    }

    /// Map width in pixels.
    pub fn pixel_width(&self) -> u32 {
        self.ir.pixel_width()
    }

    /// Map height in pixels.
    pub fn pixel_height(&self) -> u32 {
        self.ir.pixel_height()
    }

    /// Tile size in pixels as `(width, height)`.
    pub fn tile_size(&self) -> (u32, u32) {
        (self.ir.tile_w, self.ir.tile_h)
    }

    /// Pixel extent and tile size.
    pub fn bounds(&self) -> MapBounds {
        self.bounds
    }

    /// Static collision geometry.
    pub fn collisions(&self) -> &CollisionSet {
        &self.collisions
    }

    /// The walkability cache behind [`TileMap::is_walkable`].
    pub fn walkability(&self) -> &WalkabilityCache {
        &self.walkability
    }

    /// Authored spawn points by category.
    pub fn spawn_catalog(&self) -> &SpawnCatalog {
        &self.catalog
    }

    /// Pre-rendered map image.
    pub fn composite(&self) -> &Composite {
        &self.composite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::PlaceholderResolver;

    #[test]
    fn fallback_lifecycle_skips_loading() {
        let map = TileMap::fallback(&EngineConfig::default());
        assert_eq!(
            map.lifecycle(),
            &[MapState::Unloaded, MapState::Fallback, MapState::Ready]
        );
        assert_eq!(map.state(), MapState::Ready);
        assert!(map.is_fallback());
    }

    #[test]
    fn missing_file_records_the_failure_path() {
        let ctx = MapLoadContext::new("/no/such/dir/level.json", "/no/such/dir")
            .with_resolver(PlaceholderResolver);
        let map = TileMap::load(&ctx);
        assert_eq!(
            map.lifecycle(),
            &[
                MapState::Unloaded,
                MapState::Loading,
                MapState::Fallback,
                MapState::Ready
            ]
        );
        match map.source() {
            MapSource::Fallback { reason } => assert!(reason.contains("not found")),
            other => panic!("expected fallback, got {other:?}"),
        }
        assert!(matches!(TileMap::try_load(&ctx), Err(LoadError::Io { .. })));
    }

    #[test]
    fn oversized_map_is_rejected() {
        let ir = IrMap {
            width: 5000,
            height: 1,
            tile_w: 32,
            tile_h: 32,
            properties: Default::default(),
            tilesets: vec![],
            layers: vec![],
        };
        let err = TileMap::from_ir(ir, Path::new("."), &PlaceholderResolver, &EngineConfig::default())
            .err()
            .expect("too large");
        assert!(matches!(err, LoadError::MapTooLarge { width: 160_000, .. }));
    }

    #[test]
    fn pixel_size_overflow_is_rejected_not_wrapped() {
        let ir = IrMap {
            width: 65_536,
            height: 1,
            tile_w: 65_536,
            tile_h: 32,
            properties: Default::default(),
            tilesets: vec![],
            layers: vec![],
        };
        let err = TileMap::from_ir(ir, Path::new("."), &PlaceholderResolver, &EngineConfig::default())
            .err()
            .expect("too large");
        assert!(matches!(err, LoadError::MapTooLarge { width: u32::MAX, height: 32, .. }));
    }

    #[test]
    fn visible_rect_draws_only_the_view() {
        let map = TileMap::fallback(&EngineConfig::default());
        let mut canvas = render::blank_image(640, 480);
        map.draw_visible_rect(&mut canvas, vec2(100.0, 100.0), vec2(200.0, 200.0));

        assert_eq!(render::pixel(&canvas, 150, 150), render::pixel(map.composite().image(), 150, 150));
        assert_eq!(render::pixel(&canvas, 300, 300), [0; 4]);
    }
}
