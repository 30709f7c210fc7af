//! Boundary to the host page: element lookup by point and liveness by handle.
//!
//! The pipeline never owns page elements. It keeps opaque [`TargetId`]
//! handles and re-validates them through [`PageQuery::bounds`] every frame.

use crate::{
    geometry::{Point, Rect},
    Result,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

/// Opaque handle to an interactive page element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub u64);

/// Queries answered by the host page
pub trait PageQuery {
    /// Interactive element under a screen point
    fn element_at(&self, point: Point) -> Option<TargetId>;

    /// Current bounds of an element, or `None` once it has left the page
    fn bounds(&self, id: TargetId) -> Option<Rect>;
}

/// Short-lived cache of `element_at` answers on a coarse grid
#[derive(Debug, Clone)]
pub struct HitCache {
    grid_px: f64,
    ttl_ms: f64,
    capacity: usize,
    entries: HashMap<(i64, i64), (Option<TargetId>, f64)>,
}

impl HitCache {
    #[must_use]
    pub fn new(grid_px: f64, ttl_ms: f64, capacity: usize) -> Self {
        Self {
            grid_px: grid_px.max(1.0),
            ttl_ms,
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
        }
    }

    #[allow(clippy::cast_possible_truncation)] // grid cells of on-screen points fit in i64
    fn cell(&self, point: Point) -> (i64, i64) {
        (
            (point.x / self.grid_px).floor() as i64,
            (point.y / self.grid_px).floor() as i64,
        )
    }

    /// Look up the element at `point`, asking the page on a miss or stale entry
    pub fn element_at(&mut self, page: &dyn PageQuery, point: Point, now: f64) -> Option<TargetId> {
        if !point.is_finite() {
            return None;
        }
        let key = self.cell(point);
        if let Some(&(hit, cached_at)) = self.entries.get(&key) {
            if now - cached_at <= self.ttl_ms {
                return hit;
            }
        }

        let hit = page.element_at(point);
        if self.entries.len() >= self.capacity {
            let ttl = self.ttl_ms;
            self.entries.retain(|_, (_, cached_at)| now - *cached_at <= ttl);
            if self.entries.len() >= self.capacity {
                debug!("Hit cache full, clearing {} entries", self.entries.len());
                self.entries.clear();
            }
        }
        self.entries.insert(key, (hit, now));
        hit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One element of a static page layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageElement {
    pub id: TargetId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageElement {
    #[must_use]
    pub const fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Fixed list of rectangles; later elements sit on top of earlier ones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticPage {
    pub elements: Vec<PageElement>,
}

impl StaticPage {
    #[must_use]
    pub const fn new() -> Self {
        Self { elements: Vec::new() }
    }

    /// Load a layout from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Add or replace an element
    pub fn insert(&mut self, id: TargetId, rect: Rect) {
        self.remove(id);
        self.elements.push(PageElement {
            id,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        });
    }

    /// Remove an element, as a page mutation would
    pub fn remove(&mut self, id: TargetId) {
        self.elements.retain(|e| e.id != id);
    }
}

impl PageQuery for StaticPage {
    fn element_at(&self, point: Point) -> Option<TargetId> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.rect().contains(&point))
            .map(|e| e.id)
    }

    fn bounds(&self, id: TargetId) -> Option<Rect> {
        self.elements.iter().find(|e| e.id == id).map(PageElement::rect)
    }
}
