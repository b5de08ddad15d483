use log::trace;

use super::routing::route_orthogonal;
use super::text::text_direction;
use super::types::{ActivationBox, ArrowHead, EdgeLayout, Layout, Lifeline, NodeLayout, NodeShape};
use crate::config::{LayoutConfig, SequenceConfig};
use crate::geometry::{Anchor, Point, Side};
use crate::ir::{DiagramKind, SequenceDiagram};

fn message_y(cfg: &SequenceConfig, index: usize) -> f32 {
    cfg.message_start_y + index as f32 * cfg.message_gap
}

/// Four-point loop to the right of the lifeline at `x`.
fn self_loop(cfg: &SequenceConfig, x: f32, y: f32) -> Vec<Point> {
    let near = x + cfg.lifeline_clearance;
    let far = near + cfg.self_loop_width;
    let bottom = y + cfg.self_loop_height;
    vec![
        Point::new(near, y),
        Point::new(far, y),
        Point::new(far, bottom),
        Point::new(near, bottom),
    ]
}

pub(crate) fn layout_sequence(diagram: &SequenceDiagram, config: &LayoutConfig) -> Layout {
    let cfg = &config.sequence;
    let mut layout = Layout::new(DiagramKind::Sequence);

    let participant_count = diagram.participants.len() as f32;
    layout.width = cfg
        .min_width
        .max(cfg.participant_start_x + participant_count * cfg.participant_gap + cfg.right_margin);
    layout.height = cfg.min_height.max(
        cfg.message_start_y + diagram.messages.len() as f32 * cfg.message_gap + cfg.bottom_margin,
    );

    for (idx, participant) in diagram.participants.iter().enumerate() {
        let x = cfg.participant_start_x + idx as f32 * cfg.participant_gap;
        layout.insert_node(NodeLayout {
            id: participant.clone(),
            label: participant.clone(),
            shape: NodeShape::Participant,
            x: x - cfg.header_width / 2.0,
            y: cfg.header_y,
            width: cfg.header_width,
            height: cfg.header_height,
            direction: text_direction(participant),
        });
        layout.lifelines.push(Lifeline {
            participant: participant.clone(),
            x,
            y1: cfg.header_y + cfg.header_height,
            y2: layout.height - cfg.lifeline_bottom_margin,
        });
    }

    for activation in &diagram.activations {
        let Some(node) = layout.node(&activation.participant) else {
            trace!(activation = activation.id.as_str(); "dropping activation for unknown participant");
            continue;
        };
        let lifeline_x = node.center().x;
        let span = (activation.end_index as f32 - activation.start_index as f32) * cfg.message_gap;
        layout.activations.push(ActivationBox {
            id: activation.id.clone(),
            participant: activation.participant.clone(),
            x: lifeline_x - cfg.activation_width / 2.0,
            y: message_y(cfg, activation.start_index) - cfg.activation_lead,
            width: cfg.activation_width,
            height: (span + cfg.activation_tail).max(cfg.activation_min_height),
        });
    }

    // Headers are the only obstacles; lifelines and activations are crossed freely.
    let obstacles = layout.node_obstacles();
    for (idx, message) in diagram.messages.iter().enumerate() {
        let (Some(source), Some(target)) = (layout.node(&message.from), layout.node(&message.to))
        else {
            trace!(edge = message.id.as_str(); "dropping message with missing participant");
            continue;
        };
        let y = message_y(cfg, idx);
        let source_x = source.center().x;
        let target_x = target.center().x;

        let mut edge = if message.from == message.to {
            let mut edge = EdgeLayout::new(
                &message.id,
                &message.from,
                &message.to,
                self_loop(cfg, source_x, y),
            );
            edge.self_loop = true;
            edge.label_anchor = Some(Point::new(
                source_x + cfg.lifeline_clearance + cfg.self_loop_width + cfg.self_label_gap,
                y + cfg.self_label_drop,
            ));
            edge
        } else {
            let rightward = source_x < target_x;
            let (start_side, end_side, dir) = if rightward {
                (Side::Right, Side::Left, 1.0)
            } else {
                (Side::Left, Side::Right, -1.0)
            };
            let start = Anchor::new(source_x + dir * cfg.lifeline_clearance, y, start_side);
            let end = Anchor::new(target_x - dir * cfg.lifeline_clearance, y, end_side);
            let points = route_orthogonal(&start, &end, &obstacles, &cfg.route, &config.router);
            let middle = points[points.len() / 2];
            let mut edge = EdgeLayout::new(&message.id, &message.from, &message.to, points);
            edge.label_anchor = Some(middle.offset(0.0, -cfg.label_lift));
            edge
        };
        edge.label = Some(message.text.clone());
        edge.arrow_end = Some(ArrowHead::for_async(message.is_async));
        layout.edges.push(edge);
    }

    layout
}
