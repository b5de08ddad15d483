use std::collections::HashMap;

use log::trace;

use super::anchors::select_anchors;
use super::label_placement::LabelPlacer;
use super::routing::route_orthogonal;
use super::text::{text_direction, TextDirection};
use super::types::{ArrowHead, EdgeLayout, Layout, NodeLayout, NodeShape};
use crate::config::LayoutConfig;
use crate::geometry::{obstacles_excluding, Obstacle, Point, Rect};
use crate::ir::{DiagramKind, StateDiagram};

pub const START_NODE_ID: &str = "__start";
pub const END_NODE_ID: &str = "__end";

fn pseudo_node(id: &str, shape: NodeShape, center: Point, radius: f32) -> NodeLayout {
    let rect = Rect::around(center, radius);
    NodeLayout {
        id: id.to_string(),
        label: String::new(),
        shape,
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        direction: TextDirection::Ltr,
    }
}

/// Spreads parallel transitions between the same pair of nodes.
///
/// The first direction seen between a pair lanes to one side, the reverse
/// direction to the other, and each repeat moves one step further out.
#[derive(Debug, Default)]
struct LaneTracker {
    counts: HashMap<(String, String), usize>,
    signs: HashMap<(String, String), f32>,
}

impl LaneTracker {
    fn next_offset(&mut self, from: &str, to: &str, base: f32, step: f32) -> f32 {
        let key = (from.to_string(), to.to_string());
        let count = self.counts.entry(key.clone()).or_insert(0);
        let lane = *count;
        *count += 1;

        let reverse = (to.to_string(), from.to_string());
        let reverse_sign = self.signs.get(&reverse).copied();
        let sign = *self
            .signs
            .entry(key)
            .or_insert_with(|| reverse_sign.map(|s| -s).unwrap_or(1.0));
        sign * (base + lane as f32 * step)
    }
}

pub(crate) fn layout_state(diagram: &StateDiagram, config: &LayoutConfig) -> Layout {
    let cfg = &config.state;
    let mut layout = Layout::new(DiagramKind::State);

    let columns = ((diagram.states.len().max(1) as f32).sqrt().ceil() as usize).max(1);
    for (idx, state) in diagram.states.iter().enumerate() {
        let col = idx % columns;
        let row = idx / columns;
        layout.insert_node(NodeLayout {
            id: state.clone(),
            label: state.clone(),
            shape: NodeShape::State,
            x: cfg.start_x + col as f32 * cfg.cell_width,
            y: cfg.start_y + row as f32 * cfg.cell_height,
            width: cfg.state_width,
            height: cfg.state_height,
            direction: text_direction(state),
        });
    }

    let state_right = layout
        .nodes
        .values()
        .map(|node| node.rect().right())
        .fold(cfg.min_rightmost, f32::max);
    let state_bottom = layout
        .nodes
        .values()
        .map(|node| node.rect().bottom() + cfg.bottom_margin)
        .fold(cfg.min_height, f32::max);
    let mut width = layout
        .nodes
        .values()
        .map(|node| node.rect().right() + cfg.right_margin)
        .fold(cfg.min_width, f32::max);

    if diagram.transitions.iter().any(|t| t.from_pseudo()) {
        let center = Point::new(cfg.pseudo_start_x, cfg.pseudo_y);
        layout.insert_node(pseudo_node(START_NODE_ID, NodeShape::Start, center, cfg.start_radius));
    }
    if diagram.transitions.iter().any(|t| t.to_pseudo()) {
        let center = Point::new(state_right + cfg.end_gap, cfg.pseudo_y);
        width = width.max(center.x + cfg.end_gap);
        layout.insert_node(pseudo_node(END_NODE_ID, NodeShape::End, center, cfg.end_radius));
    }
    layout.width = width;
    layout.height = state_bottom;

    let node_obstacles = layout.node_obstacles();
    let node_rects: Vec<Rect> = node_obstacles.iter().map(|obs| obs.rect).collect();
    let mut lanes = LaneTracker::default();
    let mut placer = LabelPlacer::new();

    for transition in &diagram.transitions {
        let from = if transition.from_pseudo() {
            START_NODE_ID
        } else {
            transition.from.as_str()
        };
        let to = if transition.to_pseudo() {
            END_NODE_ID
        } else {
            transition.to.as_str()
        };
        let (Some(source), Some(target)) = (layout.node(from), layout.node(to)) else {
            trace!(edge = transition.id.as_str(); "dropping transition with missing state");
            continue;
        };
        let source_rect = source.rect();
        let target_rect = target.rect();

        let offset = lanes.next_offset(from, to, cfg.lane_base, cfg.lane_step);
        let (start, end) = select_anchors(&source_rect, &target_rect, &config.anchor);
        let delta_x = target_rect.center().x - source_rect.center().x;
        let delta_y = target_rect.center().y - source_rect.center().y;
        let (start, end) = if delta_x.abs() >= delta_y.abs() {
            (start.shifted(0.0, offset), end.shifted(0.0, offset))
        } else {
            (start.shifted(offset, 0.0), end.shifted(offset, 0.0))
        };

        let mut obstacles = obstacles_excluding(&node_obstacles, &[from, to]);
        obstacles.extend(
            placer
                .drawn_segments()
                .iter()
                .enumerate()
                .map(|(idx, rect)| Obstacle::new(format!("path-rect-{}", idx + 1), *rect)),
        );
        let points = route_orthogonal(&start, &end, &obstacles, &cfg.route, &config.router);

        let placement = placer.place(&transition.label, &points, &node_rects, &config.label);
        placer.record_path(&points, cfg.path_clearance);

        let mut edge = EdgeLayout::new(&transition.id, from, to, points);
        if !transition.label.is_empty() {
            edge.label = Some(transition.label.clone());
        }
        edge.label_placement = placement;
        edge.label_anchor = placement.map(|p| p.center);
        edge.arrow_end = Some(ArrowHead::for_async(transition.is_async));
        layout.edges.push(edge);
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn layout_for(input: &str) -> Layout {
        let result = parse(input);
        layout_state(&result.model.state, &LayoutConfig::default())
    }

    #[test]
    fn states_fill_a_square_grid() {
        let layout = layout_for("[A] -> [B]\n[B] -> [C]\n[C] -> [D]\n[D] -> [E]");
        let a = layout.node("A").unwrap();
        let c = layout.node("C").unwrap();
        let d = layout.node("D").unwrap();
        assert_eq!((a.x, a.y, a.width, a.height), (150.0, 140.0, 140.0, 60.0));
        assert_eq!((c.x, c.y), (150.0 + 460.0, 140.0));
        assert_eq!((d.x, d.y), (150.0, 290.0));
    }

    #[test]
    fn pseudo_nodes_only_when_referenced() {
        let plain = layout_for("[A] -> [B]");
        assert!(plain.node(START_NODE_ID).is_none());
        assert!(plain.node(END_NODE_ID).is_none());

        let layout = layout_for("[*] -> [Idle]\n[Idle] -> [*]");
        let start = layout.node(START_NODE_ID).unwrap();
        assert_eq!(start.center(), Point::new(70.0, 150.0));
        assert_eq!(start.width, 20.0);
        let end = layout.node(END_NODE_ID).unwrap();
        assert_eq!(end.center(), Point::new(620.0 + 120.0, 150.0));
        assert_eq!(end.width, 24.0);
        assert_eq!(layout.edges[0].from, START_NODE_ID);
        assert_eq!(layout.edges[1].to, END_NODE_ID);
    }

    #[test]
    fn canvas_has_a_floor() {
        let layout = layout_for("");
        assert_eq!((layout.width, layout.height), (900.0, 460.0));
    }

    #[test]
    fn lanes_alternate_and_widen() {
        let mut lanes = LaneTracker::default();
        assert_eq!(lanes.next_offset("A", "B", 12.0, 10.0), 12.0);
        assert_eq!(lanes.next_offset("B", "A", 12.0, 10.0), -12.0);
        assert_eq!(lanes.next_offset("A", "B", 12.0, 10.0), 22.0);
        assert_eq!(lanes.next_offset("B", "A", 12.0, 10.0), -22.0);
        assert_eq!(lanes.next_offset("A", "C", 12.0, 10.0), 12.0);
    }

    #[test]
    fn opposite_transitions_do_not_share_a_track() {
        let layout = layout_for("[Active] -> [Paused]: hold\n[Paused] -> [Active]: resume");
        let hold = &layout.edges[0];
        let resume = &layout.edges[1];
        assert_ne!(hold.points[0].y, resume.points.last().unwrap().y);
        let hold_label = hold.label_placement.unwrap();
        let resume_label = resume.label_placement.unwrap();
        assert!(!hold_label.rect.intersects(&resume_label.rect));
    }

    #[test]
    fn unlabeled_transitions_have_no_placement() {
        let layout = layout_for("[A] -> [B]");
        assert!(layout.edges[0].label.is_none());
        assert!(layout.edges[0].label_placement.is_none());
    }

    #[test]
    fn async_transitions_use_async_arrow() {
        let layout = layout_for("[A] --> [B]: later");
        assert_eq!(layout.edges[0].arrow_end, Some(ArrowHead::Async));
        assert_eq!(layout.edges[0].label.as_deref(), Some("later"));
    }
}
