use serde::Serialize;

use super::text::estimate_text_width;
use crate::config::LabelConfig;
use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelPlacement {
    pub center: Point,
    pub rect: Rect,
}

/// Places edge labels one at a time, remembering what earlier edges took.
///
/// Each label avoids nodes, previously placed labels and previously drawn
/// path segments, in that order of importance, and otherwise stays close to
/// the middle of its path.
#[derive(Debug, Clone, Default)]
pub struct LabelPlacer {
    placed_labels: Vec<Rect>,
    drawn_segments: Vec<Rect>,
}

impl LabelPlacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placed_labels(&self) -> &[Rect] {
        &self.placed_labels
    }

    /// Segment boxes of every path recorded so far.
    pub fn drawn_segments(&self) -> &[Rect] {
        &self.drawn_segments
    }

    /// Marks `path` as drawn so later labels and routes keep clear of it.
    pub fn record_path(&mut self, path: &[Point], clearance: f32) {
        self.drawn_segments.extend(
            path.windows(2)
                .map(|pair| Rect::from_segment(pair[0], pair[1], clearance)),
        );
    }

    /// Chooses a spot for `label` along `path` and reserves it.
    ///
    /// Returns `None` for empty labels and degenerate paths.
    pub fn place(
        &mut self,
        label: &str,
        path: &[Point],
        nodes: &[Rect],
        config: &LabelConfig,
    ) -> Option<LabelPlacement> {
        if label.is_empty() || path.len() < 2 {
            return None;
        }
        let midpoint = path[path.len() / 2];

        let mut best: Option<(f32, LabelPlacement)> = None;
        for candidate in label_candidates(path, midpoint, config) {
            let rect = label_box(label, candidate, config);
            let score = self.score(&rect, candidate, midpoint, nodes, config);
            if best.as_ref().is_none_or(|(best_score, _)| score < *best_score) {
                best = Some((
                    score,
                    LabelPlacement {
                        center: candidate,
                        rect,
                    },
                ));
            }
        }

        let (_, placement) = best?;
        self.placed_labels.push(placement.rect);
        Some(placement)
    }

    fn score(
        &self,
        rect: &Rect,
        candidate: Point,
        midpoint: Point,
        nodes: &[Rect],
        config: &LabelConfig,
    ) -> f32 {
        let mut score = 0.0;
        let node_probe = rect.inflate(config.node_clearance);
        score += nodes.iter().filter(|node| node_probe.intersects(node)).count() as f32
            * config.node_overlap_penalty;
        let label_probe = rect.inflate(config.label_clearance);
        score += self
            .placed_labels
            .iter()
            .filter(|placed| label_probe.intersects(placed))
            .count() as f32
            * config.label_overlap_penalty;
        let path_probe = rect.inflate(config.path_clearance);
        score += self
            .drawn_segments
            .iter()
            .filter(|segment| path_probe.intersects(segment))
            .count() as f32
            * config.path_overlap_penalty;
        score + candidate.manhattan(midpoint) * config.distance_weight
    }
}

fn label_box(label: &str, center: Point, config: &LabelConfig) -> Rect {
    let width = estimate_text_width(label, &config.char_widths) + config.box_padding;
    let height = config.box_height;
    Rect::new(
        center.x - width / 2.0,
        center.y - height / 2.0,
        width,
        height,
    )
}

fn label_candidates(path: &[Point], midpoint: Point, config: &LabelConfig) -> Vec<Point> {
    let mut candidates = Vec::with_capacity(path.len() * 2 + 2);
    for pair in path.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let mid = Point::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
        if start.y == end.y {
            candidates.push(Point::new(mid.x, start.y - config.offset_above));
            candidates.push(Point::new(mid.x, start.y + config.offset_below));
        } else {
            candidates.push(Point::new(start.x - config.offset_side, mid.y));
            candidates.push(Point::new(start.x + config.offset_side, mid.y));
        }
    }
    candidates.push(midpoint.offset(0.0, -config.fallback_offset));
    candidates.push(midpoint.offset(0.0, config.fallback_offset));

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|p| seen.insert((p.x.round() as i64, p.y.round() as i64)));
    candidates
}
