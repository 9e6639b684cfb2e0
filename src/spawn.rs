//! Spawn point catalog and resolution.

use macroquad::prelude::*;

use crate::collision::{is_collision_group, COLLISION_CLASS};
use crate::ir_map::IrMap;
use crate::spatial::{MapBounds, WalkabilityCache};

/// Category used by the customer spawner.
pub const CUSTOMER_SPAWN: &str = "CustomerSpawn";

const SPAWN_MARKER: &str = "spawn";

/// Authored spawn points grouped by category, in authoring order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnCatalog {
    entries: Vec<(String, Vec<Vec2>)>,
}

impl SpawnCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every non-collision object whose own name or group name
    /// mentions "spawn". The category is the object name, or the group name
    /// for unnamed objects.
    pub fn from_map(map: &IrMap) -> Self {
        let mut catalog = Self::new();
        for (group, objects) in map.object_groups() {
            let group_is_collision = is_collision_group(&group.name);
            let group_is_spawn = contains_ci(&group.name, SPAWN_MARKER);
            for obj in objects {
                if group_is_collision || obj.class_name == COLLISION_CLASS {
                    continue;
                }
                if !group_is_spawn && !contains_ci(&obj.name, SPAWN_MARKER) {
                    continue;
                }
                let category = if obj.name.is_empty() {
                    &group.name
                } else {
                    &obj.name
                };
                catalog.insert(category, obj.position());
            }
        }
        catalog
    }

    /// Appends a point, creating the category on first use.
    pub fn insert(&mut self, category: &str, point: Vec2) {
        match self.entries.iter_mut().find(|(name, _)| name == category) {
            Some((_, points)) => points.push(point),
            None => self.entries.push((category.to_owned(), vec![point])),
        }
    }

    /// Points of the exact category, if present.
    pub fn get(&self, category: &str) -> Option<&[Vec2]> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, points)| points.as_slice())
    }

    /// Exact match if there is one, otherwise every category whose name
    /// contains `query` case-insensitively, in catalog order.
    pub fn matching(&self, query: &str) -> Vec<Vec2> {
        if let Some(points) = self.get(query) {
            return points.to_vec();
        }
        self.entries
            .iter()
            .filter(|(name, _)| contains_ci(name, query))
            .flat_map(|(_, points)| points.iter().copied())
            .collect()
    }

    /// Categories and their points, in insertion order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Vec2])> {
        self.entries
            .iter()
            .map(|(name, points)| (name.as_str(), points.as_slice()))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no spawn points were authored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(needle.to_lowercase().as_str())
}

/// Which resolution strategy produced a spawn list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnTier {
    /// Catalog category lookup.
    Catalog,
    /// Objects whose name or class mention the category.
    ObjectScan,
    /// Walkable points along the map borders.
    EdgeScan,
    /// Unchecked map center.
    LastResort,
}

/// Edge scan parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeScan {
    /// Distance from each map edge.
    pub margin: u32,
    /// Spacing between candidates.
    pub step: u32,
}

impl Default for EdgeScan {
    fn default() -> Self {
        Self {
            margin: 100,
            step: 50,
        }
    }
}

/// Resolves spawn categories to world points. Borrows the map data and
/// never mutates it, so repeated calls return the same points.
pub struct SpawnResolver<'a> {
    catalog: &'a SpawnCatalog,
    map: &'a IrMap,
    walkability: &'a WalkabilityCache,
    bounds: MapBounds,
    edge: EdgeScan,
}

impl<'a> SpawnResolver<'a> {
    /// Resolver over one map's data.
    pub fn new(
        catalog: &'a SpawnCatalog,
        map: &'a IrMap,
        walkability: &'a WalkabilityCache,
        bounds: MapBounds,
        edge: EdgeScan,
    ) -> Self {
        Self {
            catalog,
            map,
            walkability,
            bounds,
            edge,
        }
    }

    /// Never returns an empty list.
    pub fn resolve(&self, category: &str) -> Vec<Vec2> {
        self.resolve_with_tier(category).0
    }

    /// Like [`SpawnResolver::resolve`], also reporting which tier answered.
    pub fn resolve_with_tier(&self, category: &str) -> (Vec<Vec2>, SpawnTier) {
        let points = self.from_catalog(category);
        if !points.is_empty() {
            return (points, SpawnTier::Catalog);
        }

        let points = self.from_objects(category);
        if !points.is_empty() {
            return (points, SpawnTier::ObjectScan);
        }

        let points = self.from_edges();
        if !points.is_empty() {
            tracing::debug!(category, count = points.len(), "spawn points from edge scan");
            return (points, SpawnTier::EdgeScan);
        }

        let center = self.bounds.center();
        tracing::warn!(
            category,
            x = center.x,
            y = center.y,
            "no walkable spawn point found; using unchecked map center"
        );
        (vec![center], SpawnTier::LastResort)
    }

    fn keep_walkable(&self, p: Vec2, category: &str) -> bool {
        let ok = self.walkability.is_walkable(p.x, p.y);
        if !ok {
            tracing::warn!(category, x = p.x, y = p.y, "spawn point is not walkable");
        }
        ok
    }

    fn from_catalog(&self, category: &str) -> Vec<Vec2> {
        self.catalog
            .matching(category)
            .into_iter()
            .filter(|p| self.keep_walkable(*p, category))
            .collect()
    }

    fn from_objects(&self, category: &str) -> Vec<Vec2> {
        self.map
            .object_groups()
            .flat_map(|(_, objects)| objects.iter())
            .filter(|o| contains_ci(&o.name, category) || contains_ci(&o.class_name, category))
            .map(|o| o.position())
            .filter(|p| self.keep_walkable(*p, category))
            .collect()
    }

    fn from_edges(&self) -> Vec<Vec2> {
        let w = self.bounds.width as u32;
        let h = self.bounds.height as u32;
        let EdgeScan { margin, step } = self.edge;
        let step = step.max(1) as usize;
        let far_x = w.saturating_sub(margin);
        let far_y = h.saturating_sub(margin);

        let horizontal = (margin..far_x).step_by(step);
        let vertical = (margin..far_y).step_by(step);
        let candidates = horizontal
            .clone()
            .map(|x| (x, margin))
            .chain(horizontal.map(|x| (x, far_y)))
            .chain(vertical.clone().map(|y| (margin, y)))
            .chain(vertical.map(|y| (far_x, y)));

        let mut points: Vec<Vec2> = Vec::new();
        for (x, y) in candidates {
            let p = vec2(x as f32, y as f32);
            if !points.contains(&p) && self.walkability.is_walkable(p.x, p.y) {
                points.push(p);
            }
        }
        points
    }
}
