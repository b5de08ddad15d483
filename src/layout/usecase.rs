use log::trace;

use super::anchors::select_anchors;
use super::routing::route_orthogonal;
use super::text::text_direction;
use super::types::{ArrowHead, EdgeLayout, Layout, NodeLayout, NodeShape};
use crate::config::LayoutConfig;
use crate::geometry::obstacles_excluding;
use crate::ir::{DiagramKind, UseCaseDiagram};

/// Actors and use cases live in separate namespaces; prefixes keep their
/// node ids apart when a name is used for both.
pub(crate) fn actor_node_id(name: &str) -> String {
    format!("actor:{name}")
}

pub(crate) fn use_case_node_id(name: &str) -> String {
    format!("usecase:{name}")
}

pub(crate) fn layout_use_case(diagram: &UseCaseDiagram, config: &LayoutConfig) -> Layout {
    let cfg = &config.usecase;
    let mut layout = Layout::new(DiagramKind::UseCase);

    for (idx, actor) in diagram.actors.iter().enumerate() {
        let center_y = cfg.actor_start_y + idx as f32 * cfg.actor_spacing;
        layout.insert_node(NodeLayout {
            id: actor_node_id(actor),
            label: actor.clone(),
            shape: NodeShape::Actor,
            x: cfg.actor_x - cfg.actor_width / 2.0,
            y: center_y - cfg.actor_height / 2.0,
            width: cfg.actor_width,
            height: cfg.actor_height,
            direction: text_direction(actor),
        });
    }
    for (idx, use_case) in diagram.use_cases.iter().enumerate() {
        let center_y = cfg.use_case_start_y + idx as f32 * cfg.use_case_spacing;
        layout.insert_node(NodeLayout {
            id: use_case_node_id(use_case),
            label: use_case.clone(),
            shape: NodeShape::UseCase,
            x: cfg.use_case_x - cfg.use_case_width / 2.0,
            y: center_y - cfg.use_case_height / 2.0,
            width: cfg.use_case_width,
            height: cfg.use_case_height,
            direction: text_direction(use_case),
        });
    }

    let content_bottom = (cfg.actor_start_y + diagram.actors.len() as f32 * cfg.actor_spacing)
        .max(cfg.use_case_start_y + diagram.use_cases.len() as f32 * cfg.use_case_spacing)
        .max(cfg.min_height);
    let content_right = layout
        .nodes
        .values()
        .map(|node| node.rect().right() + cfg.margin)
        .fold(cfg.min_width, f32::max);
    layout.width = content_right;
    layout.height = content_bottom + cfg.margin;

    let obstacles = layout.node_obstacles();
    for association in &diagram.associations {
        let from = actor_node_id(&association.actor);
        let to = use_case_node_id(&association.use_case);
        let (Some(actor), Some(use_case)) = (layout.node(&from), layout.node(&to)) else {
            trace!(edge = association.id.as_str(); "dropping association with missing endpoint");
            continue;
        };
        let (start, end) = select_anchors(&actor.rect(), &use_case.rect(), &config.anchor);
        let others = obstacles_excluding(&obstacles, &[from.as_str(), to.as_str()]);
        let points = route_orthogonal(&start, &end, &others, &cfg.route, &config.router);

        let mut edge = EdgeLayout::new(&association.id, &from, &to, points);
        edge.arrow_end = Some(ArrowHead::for_async(association.is_async));
        layout.edges.push(edge);
    }

    layout
}
