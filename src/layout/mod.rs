mod anchors;
mod class;
mod label_placement;
mod routing;
mod sequence;
mod state;
mod text;
pub(crate) mod types;
mod usecase;

pub use anchors::select_anchors;
pub use label_placement::{LabelPlacement, LabelPlacer};
pub use routing::route_orthogonal;
pub use state::{END_NODE_ID, START_NODE_ID};
pub use text::TextDirection;
pub use types::*;

use log::debug;

use crate::config::LayoutConfig;
use crate::ir::{DiagramKind, DiagramModel};

/// Lays out the `kind` sub-model of `model`.
///
/// Edges whose endpoints are not in the sub-model are skipped; every other
/// edge gets a routed path.
pub fn compute_layout(model: &DiagramModel, kind: DiagramKind, config: &LayoutConfig) -> Layout {
    let layout = match kind {
        DiagramKind::UseCase => usecase::layout_use_case(&model.use_case, config),
        DiagramKind::Sequence => sequence::layout_sequence(&model.sequence, config),
        DiagramKind::Class => class::layout_class(&model.class, config),
        DiagramKind::State => state::layout_state(&model.state, config),
    };
    debug!(
        kind = kind.as_str(),
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        width = layout.width,
        height = layout.height;
        "computed layout"
    );
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Association, ClassRelation, Message, RelationKind, Transition};
    use crate::parser::parse;

    fn dangling_model() -> DiagramModel {
        let mut model = DiagramModel::default();

        model.use_case.actors.insert("Admin".to_string());
        model.use_case.associations.push(Association {
            id: "usecase-association-1".to_string(),
            actor: "Admin".to_string(),
            use_case: "Z".to_string(),
            is_async: false,
        });

        model.sequence.participants.insert("P".to_string());
        model.sequence.messages.push(Message {
            id: "sequence-message-1".to_string(),
            from: "P".to_string(),
            to: "Q".to_string(),
            text: "lost".to_string(),
            is_async: false,
        });

        model.class.ensure_class("User");
        for (idx, kind) in [RelationKind::Inheritance, RelationKind::Association]
            .into_iter()
            .enumerate()
        {
            let (marker_start, marker_end) = kind.markers();
            model.class.relations.push(ClassRelation {
                id: format!("class-relation-{}", idx + 1),
                from: "User".to_string(),
                to: "Ghost".to_string(),
                kind,
                marker_start,
                marker_end,
            });
        }

        model.state.states.insert("Idle".to_string());
        model.state.transitions.push(Transition {
            id: "state-transition-1".to_string(),
            from: "Idle".to_string(),
            to: "Nope".to_string(),
            label: "go".to_string(),
            is_async: false,
        });
        model
    }

    #[test]
    fn edges_with_undeclared_endpoints_are_dropped() {
        let model = dangling_model();
        let config = LayoutConfig::default();
        for kind in DiagramKind::ALL {
            let layout = compute_layout(&model, kind, &config);
            assert!(layout.edges.is_empty(), "{kind}: {:?}", layout.edges);
            assert_eq!(layout.nodes.len(), 1, "{kind}");
        }
    }

    #[test]
    fn every_kind_lays_out_an_empty_model() {
        let model = DiagramModel::default();
        let config = LayoutConfig::default();
        for kind in DiagramKind::ALL {
            let layout = compute_layout(&model, kind, &config);
            assert_eq!(layout.kind, kind);
            assert!(layout.width > 0.0 && layout.height > 0.0);
            assert!(layout.nodes.is_empty());
        }
    }

    #[test]
    fn same_input_gives_same_scene() {
        let text = "[*] -> [Idle]\n[Idle] -> [Active]: start\n[Active] -> [Idle]: stop\n[Active] -> [*]";
        let result = parse(text);
        let config = LayoutConfig::default();
        let a = compute_layout(&result.model, DiagramKind::State, &config);
        let b = compute_layout(&result.model, DiagramKind::State, &config);
        let points = |layout: &Layout| -> Vec<_> {
            layout.edges.iter().map(|edge| edge.points.clone()).collect()
        };
        assert_eq!(points(&a), points(&b));
    }

    #[test]
    fn edges_reference_laid_out_nodes() {
        let text = "class User {\n+name: string\n}\nUser <|-- Admin\nUser *-- Profile";
        let result = parse(text);
        let layout = compute_layout(&result.model, DiagramKind::Class, &LayoutConfig::default());
        for edge in &layout.edges {
            assert!(layout.node(&edge.from).is_some());
            assert!(layout.node(&edge.to).is_some());
            assert!(edge.points.len() >= 2);
        }
    }
}
