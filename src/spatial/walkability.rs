use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use macroquad::prelude::*;

use crate::collision::CollisionSet;
use crate::spatial::{probe_rect, quantize, rects_overlap, MapBounds};

/// How the cache is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Every cell is computed when the cache is loaded.
    Eager,
    /// Cells are computed on first query and memoized.
    Lazy,
}

struct Geometry {
    collisions: Rc<CollisionSet>,
    bounds: MapBounds,
}

impl Geometry {
    fn compute(&self, p: Vec2, probe_half: f32) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }

        let probe = probe_rect(p, probe_half);
        if self.collisions.rects.iter().any(|r| rects_overlap(&probe, r)) {
            return false;
        }

        !self
            .collisions
            .blocked_tiles
            .contains(&self.bounds.world_to_tile(p))
    }
}

/// Quantized memo of point walkability.
///
/// A cell keyed `(kx, ky)` always holds what [`WalkabilityCache::compute_walkable`]
/// returns at `(kx, ky)`; the cache never answers anything the direct
/// computation would not. Single game-loop thread only.
pub struct WalkabilityCache {
    geometry: Option<Geometry>,
    step: u32,
    probe_half: f32,
    mode: CacheMode,
    cells: RefCell<HashMap<(i32, i32), bool>>,
}

impl WalkabilityCache {
    /// An empty cache with no collision data. Every query answers `false`
    /// until [`WalkabilityCache::load`] is called.
    pub fn unloaded(step: u32, probe_half: f32) -> Self {
        Self {
            geometry: None,
            step: step.max(1),
            probe_half,
            mode: CacheMode::Lazy,
            cells: RefCell::new(HashMap::new()),
        }
    }

    /// Builds a loaded cache, picking eager mode when the map has at most
    /// `eager_cell_limit` cells.
    pub fn new(
        collisions: impl Into<Rc<CollisionSet>>,
        bounds: MapBounds,
        step: u32,
        probe_half: f32,
        eager_cell_limit: usize,
    ) -> Self {
        let mut cache = Self::unloaded(step, probe_half);
        let mode = if cache.cell_count(&bounds) <= eager_cell_limit {
            CacheMode::Eager
        } else {
            CacheMode::Lazy
        };
        cache.load(collisions, bounds, mode);
        cache
    }

    /// Attaches collision data, discarding any memoized cells.
    pub fn load(
        &mut self,
        collisions: impl Into<Rc<CollisionSet>>,
        bounds: MapBounds,
        mode: CacheMode,
    ) {
        self.geometry = Some(Geometry {
            collisions: collisions.into(),
            bounds,
        });
        self.mode = mode;
        self.cells.get_mut().clear();
        if mode == CacheMode::Eager {
            self.prepopulate();
        }
    }

    fn cell_count(&self, bounds: &MapBounds) -> usize {
        let step = self.step as f32;
        let cols = (bounds.width / step).ceil() as usize;
        let rows = (bounds.height / step).ceil() as usize;
        cols.saturating_mul(rows)
    }

    /// Computes every cell whose key lies inside the map.
    pub fn prepopulate(&self) {
        let Some(g) = &self.geometry else {
            return;
        };

        let w = g.bounds.width as i32;
        let h = g.bounds.height as i32;
        let step = self.step as usize;
        let mut cells = self.cells.borrow_mut();
        for x in (0..w).step_by(step) {
            for y in (0..h).step_by(step) {
                let v = g.compute(vec2(x as f32, y as f32), self.probe_half);
                cells.insert((x, y), v);
            }
        }
        tracing::debug!(entries = cells.len(), "walkability cache built");
    }

    /// `true` once collision data is attached.
    pub fn is_loaded(&self) -> bool {
        self.geometry.is_some()
    }

    /// Fill strategy in use.
    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Quantization step in pixels.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Number of memoized cells.
    pub fn len(&self) -> usize {
        self.cells.borrow().len()
    }

    /// `true` when no cell has been memoized.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attached collision data.
    pub fn collisions(&self) -> Option<&CollisionSet> {
        self.geometry.as_ref().map(|g| g.collisions.as_ref())
    }

    /// Attached map bounds.
    pub fn bounds(&self) -> Option<MapBounds> {
        self.geometry.as_ref().map(|g| g.bounds)
    }

    /// Ground truth, bypassing the cache. `false` when unloaded.
    pub fn compute_walkable(&self, x: f32, y: f32) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(|g| g.compute(vec2(x, y), self.probe_half))
    }

    /// Cached walkability of the cell nearest to `(x, y)`.
    ///
    /// Points outside the map, non-finite points, and any query made before
    /// collision data exists are not walkable.
    pub fn is_walkable(&self, x: f32, y: f32) -> bool {
        let Some(g) = &self.geometry else {
            return false;
        };
        if !g.bounds.contains(vec2(x, y)) {
            return false;
        }

        let key = (quantize(x, self.step), quantize(y, self.step));
        if let Some(&v) = self.cells.borrow().get(&key) {
            return v;
        }

        let v = g.compute(vec2(key.0 as f32, key.1 as f32), self.probe_half);
        self.cells.borrow_mut().insert(key, v);
        v
    }
}
