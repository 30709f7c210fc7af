use super::Resolution;
use crate::{
    config::DwellConfig,
    geometry::Point,
    page::{PageQuery, TargetId},
};
use log::debug;

/// Keeps a snapped target while the point stays near its centre
#[derive(Debug, Clone)]
pub struct StickySnap {
    radius_px: f64,
    scale: f64,
    snapped: Option<TargetId>,
}

impl StickySnap {
    #[must_use]
    pub const fn new(config: &DwellConfig) -> Self {
        Self {
            radius_px: config.sticky_radius_px,
            scale: config.sticky_scale,
            snapped: None,
        }
    }

    /// Filter a fresh resolution through the snapped target
    ///
    /// The snapped target wins while it still exists and `point` lies within
    /// its sticky radius. Otherwise the fresh resolution, if any, is snapped.
    pub fn apply(&mut self, fresh: Option<Resolution>, point: Point, page: &dyn PageQuery) -> Option<Resolution> {
        if let Some(id) = self.snapped {
            if fresh.is_some_and(|r| r.target == id) {
                return fresh;
            }
            if let Some(bounds) = page.bounds(id) {
                let radius = self.radius_px.max(bounds.half_diagonal() * self.scale);
                if point.is_finite() && point.distance(&bounds.center()) <= radius {
                    return Some(Resolution {
                        target: id,
                        bounds,
                        centroid: point,
                        hits: fresh.map_or(0, |r| r.hits),
                    });
                }
            }
        }

        let next = fresh.map(|r| r.target);
        if next != self.snapped {
            debug!("Snap target {:?} -> {:?}", self.snapped, next);
        }
        self.snapped = next;
        fresh
    }

    #[must_use]
    pub const fn snapped(&self) -> Option<TargetId> {
        self.snapped
    }

    pub fn clear(&mut self) {
        self.snapped = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry::Rect, page::StaticPage};

    fn resolution(page: &StaticPage, id: u64) -> Option<Resolution> {
        let bounds = page.bounds(TargetId(id))?;
        Some(Resolution {
            target: TargetId(id),
            bounds,
            centroid: bounds.center(),
            hits: 5,
        })
    }

    fn page() -> StaticPage {
        let mut page = StaticPage::new();
        page.insert(TargetId(1), Rect::new(100.0, 100.0, 40.0, 40.0));
        page.insert(TargetId(2), Rect::new(145.0, 100.0, 40.0, 40.0));
        page
    }

    #[test]
    fn test_snap_resists_neighbour() {
        let page = page();
        let mut snap = StickySnap::new(&DwellConfig::default());
        assert_eq!(snap.apply(resolution(&page, 1), Point::new(120.0, 120.0), &page).map(|r| r.target), Some(TargetId(1)));

        // Neighbour resolves, but the point is still within the sticky radius
        let kept = snap.apply(resolution(&page, 2), Point::new(150.0, 120.0), &page);
        assert_eq!(kept.map(|r| r.target), Some(TargetId(1)));

        // A momentary miss keeps the snap as well
        let kept = snap.apply(None, Point::new(125.0, 125.0), &page);
        assert_eq!(kept.map(|r| r.target), Some(TargetId(1)));
    }

    #[test]
    fn test_snap_released_outside_radius() {
        let page = page();
        let mut snap = StickySnap::new(&DwellConfig::default());
        snap.apply(resolution(&page, 1), Point::new(120.0, 120.0), &page);
        let moved = snap.apply(resolution(&page, 2), Point::new(400.0, 120.0), &page);
        assert_eq!(moved.map(|r| r.target), Some(TargetId(2)));
        assert_eq!(snap.snapped(), Some(TargetId(2)));

        assert!(snap.apply(None, Point::new(900.0, 900.0), &page).is_none());
        assert_eq!(snap.snapped(), None);
    }

    #[test]
    fn test_removed_target_releases_snap() {
        let mut page = page();
        let mut snap = StickySnap::new(&DwellConfig::default());
        snap.apply(resolution(&page, 1), Point::new(120.0, 120.0), &page);
        page.remove(TargetId(1));
        assert!(snap.apply(None, Point::new(120.0, 120.0), &page).is_none());
    }
}
