use crate::{
    config::DwellConfig,
    geometry::{Point, PointSample, PointWindow, Rect},
    page::{HitCache, PageQuery, TargetId},
};
use std::collections::HashMap;

/// A target chosen from the point window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub target: TargetId,
    /// Bounds as reported by the page this frame
    pub bounds: Rect,
    /// Centroid of the window points that hit the target
    pub centroid: Point,
    pub hits: usize,
}

#[derive(Default)]
struct Tally {
    hits: usize,
    sum_x: f64,
    sum_y: f64,
    last_seen: usize,
}

/// Resolves the element the recent points agree on
#[derive(Debug, Clone)]
pub struct TargetResolver {
    window: PointWindow,
    cache: HitCache,
    min_hits: usize,
    padding: f64,
}

impl TargetResolver {
    #[must_use]
    pub fn new(config: &DwellConfig) -> Self {
        Self {
            window: PointWindow::new(config.resolver_window_size, config.resolver_window_ms),
            cache: HitCache::new(config.hit_cache_grid_px, config.hit_cache_ttl_ms, config.hit_cache_capacity),
            min_hits: config.min_hits,
            padding: config.target_padding_px,
        }
    }

    pub fn push(&mut self, sample: PointSample) {
        self.window.push(sample);
    }

    /// Majority element of the window, if it clears the hit minimum and
    /// the centroid of its hits lies inside its padded bounds
    #[allow(clippy::cast_precision_loss)] // hit counts are small
    pub fn resolve(&mut self, page: &dyn PageQuery, now: f64) -> Option<Resolution> {
        self.window.evict_older_than(now);

        let mut tallies: HashMap<TargetId, Tally> = HashMap::new();
        for (index, sample) in self.window.iter().enumerate() {
            let point = sample.point();
            if let Some(id) = self.cache.element_at(page, point, now) {
                let tally = tallies.entry(id).or_default();
                tally.hits += 1;
                tally.sum_x += point.x;
                tally.sum_y += point.y;
                tally.last_seen = index;
            }
        }

        // Ties go to the element hit most recently
        let (target, tally) = tallies
            .into_iter()
            .max_by(|(_, a), (_, b)| a.hits.cmp(&b.hits).then(a.last_seen.cmp(&b.last_seen)))?;
        if tally.hits < self.min_hits {
            return None;
        }

        let bounds = page.bounds(target)?;
        let n = tally.hits as f64;
        let centroid = Point::new(tally.sum_x / n, tally.sum_y / n);
        if !bounds.padded(self.padding).contains(&centroid) {
            return None;
        }
        Some(Resolution {
            target,
            bounds,
            centroid,
            hits: tally.hits,
        })
    }

    #[must_use]
    pub const fn window(&self) -> &PointWindow {
        &self.window
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::StaticPage;

    fn page() -> StaticPage {
        let mut page = StaticPage::new();
        page.insert(TargetId(1), Rect::new(100.0, 100.0, 200.0, 100.0));
        page.insert(TargetId(2), Rect::new(320.0, 100.0, 200.0, 100.0));
        page
    }

    fn feed(resolver: &mut TargetResolver, points: &[(f64, f64)]) -> f64 {
        let mut t = 0.0;
        for &(x, y) in points {
            resolver.push(PointSample::new(x, y, t));
            t += 10.0;
        }
        t
    }

    #[test]
    fn test_majority_target_resolved() {
        let mut resolver = TargetResolver::new(&DwellConfig::default());
        let page = page();
        let now = feed(
            &mut resolver,
            &[(150.0, 150.0), (160.0, 140.0), (400.0, 150.0), (170.0, 150.0), (155.0, 160.0)],
        );
        let resolution = resolver.resolve(&page, now).unwrap();
        assert_eq!(resolution.target, TargetId(1));
        assert_eq!(resolution.hits, 4);
        assert!((resolution.centroid.x - 158.75).abs() < 1e-9);
    }

    #[test]
    fn test_min_hits_required() {
        let mut resolver = TargetResolver::new(&DwellConfig::default());
        let now = feed(&mut resolver, &[(150.0, 150.0), (160.0, 140.0), (170.0, 150.0)]);
        assert!(resolver.resolve(&page(), now).is_none());
    }

    #[test]
    fn test_vanished_target_not_resolved() {
        let mut resolver = TargetResolver::new(&DwellConfig::default());
        let mut page = page();
        let now = feed(&mut resolver, &[(150.0, 150.0); 5]);
        assert!(resolver.resolve(&page, now).is_some());

        page.remove(TargetId(1));
        resolver.clear();
        let now = feed(&mut resolver, &[(150.0, 150.0); 5]);
        assert!(resolver.resolve(&page, now).is_none());
    }

    #[test]
    fn test_stale_points_evicted() {
        let mut resolver = TargetResolver::new(&DwellConfig::default());
        feed(&mut resolver, &[(150.0, 150.0); 5]);
        assert!(resolver.resolve(&page(), 2000.0).is_none());
        assert!(resolver.window().is_empty());
    }
}
