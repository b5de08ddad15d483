use std::path::Path;

use diagram_engine::geometry::{Point, Rect};
use diagram_engine::{
    DetectedType, DiagramKind, Layout, LayoutConfig, LayoutDump, compute_layout, parse,
    resolve_active_kind,
};

const EPS: f32 = 1e-3;

fn layout_fixture(path: &Path) -> (DetectedType, Layout) {
    let input = std::fs::read_to_string(path).expect("fixture read failed");
    let parsed = parse(&input);
    assert!(
        parsed.errors.is_empty(),
        "{}: unexpected parse errors {:?}",
        path.display(),
        parsed.errors
    );
    let kind = resolve_active_kind(&parsed, None).expect("fixture has no detectable type");
    let layout = compute_layout(&parsed.model, kind, &LayoutConfig::default());
    (parsed.detected_type, layout)
}

fn on_boundary(point: Point, rect: &Rect) -> bool {
    (point.x - rect.x).abs() < EPS
        || (point.x - rect.right()).abs() < EPS
        || (point.y - rect.y).abs() < EPS
        || (point.y - rect.bottom()).abs() < EPS
}

fn assert_edge_contract(layout: &Layout, fixture: &str) {
    for edge in &layout.edges {
        let source = layout
            .node(&edge.from)
            .unwrap_or_else(|| panic!("{fixture}: {} has no source node", edge.id));
        let target = layout
            .node(&edge.to)
            .unwrap_or_else(|| panic!("{fixture}: {} has no target node", edge.id));
        assert!(edge.points.len() >= 2, "{fixture}: {} is too short", edge.id);

        for pair in edge.points.windows(2) {
            let dx = (pair[0].x - pair[1].x).abs();
            let dy = (pair[0].y - pair[1].y).abs();
            assert!(
                dx < EPS || dy < EPS,
                "{fixture}: {} has a diagonal segment {:?}",
                edge.id,
                pair
            );
            assert!(dx >= EPS || dy >= EPS, "{fixture}: {} repeats a point", edge.id);
        }

        let first = edge.points[0];
        let last = edge.points[edge.points.len() - 1];
        match layout.kind {
            DiagramKind::UseCase | DiagramKind::Class => {
                assert!(on_boundary(first, &source.rect()), "{fixture}: {} start", edge.id);
                assert!(on_boundary(last, &target.rect()), "{fixture}: {} end", edge.id);
            }
            // Lane offsets slide state anchors along their side.
            DiagramKind::State => {
                assert!(source.rect().inflate(40.0).contains(first), "{fixture}: {} start", edge.id);
                assert!(target.rect().inflate(40.0).contains(last), "{fixture}: {} end", edge.id);
            }
            DiagramKind::Sequence => {}
        }
    }
}

fn assert_nodes_on_canvas(layout: &Layout, fixture: &str) {
    for node in layout.nodes.values() {
        let rect = node.rect();
        assert!(rect.x >= 0.0 && rect.y >= 0.0, "{fixture}: {} off canvas", node.id);
        assert!(
            rect.right() <= layout.width + EPS && rect.bottom() <= layout.height + EPS,
            "{fixture}: {} exceeds the canvas",
            node.id
        );
    }
}

#[test]
fn lay_out_all_fixtures() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");

    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        ("usecase/basic.dgm", DiagramKind::UseCase),
        ("usecase/persian.dgm", DiagramKind::UseCase),
        ("sequence/basic.dgm", DiagramKind::Sequence),
        ("sequence/self_and_nested.dgm", DiagramKind::Sequence),
        ("class/basic.dgm", DiagramKind::Class),
        ("class/hierarchy.dgm", DiagramKind::Class),
        ("state/basic.dgm", DiagramKind::State),
        ("state/dense.dgm", DiagramKind::State),
    ];

    for (rel, kind) in candidates {
        let path = root.join(rel);
        assert!(path.exists(), "fixture missing: {rel}");
        let (detected, layout) = layout_fixture(&path);
        assert_eq!(detected, DetectedType::Kind(kind), "{rel}");
        assert_eq!(layout.kind, kind, "{rel}");
        assert!(!layout.edges.is_empty(), "{rel}: no edges");
        assert_edge_contract(&layout, rel);
        assert_nodes_on_canvas(&layout, rel);
    }
}

#[test]
fn layouts_are_deterministic() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/state/dense.dgm");
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    let config = LayoutConfig::default();

    let first = parse(&input);
    let second = parse(&input);
    assert_eq!(first, second);

    let a = compute_layout(&first.model, DiagramKind::State, &config);
    let b = compute_layout(&second.model, DiagramKind::State, &config);
    let json_a = serde_json::to_string(&LayoutDump::from_layout(&a, &first)).unwrap();
    let json_b = serde_json::to_string(&LayoutDump::from_layout(&b, &second)).unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn mixed_input_lays_out_the_selected_dialect() {
    let parsed = parse("User -> (Login)\nAlice -> Bob: Hi\n[A] -> [B]");
    assert_eq!(parsed.detected_type, DetectedType::Mixed);

    let kind = resolve_active_kind(&parsed, Some(DiagramKind::State)).unwrap();
    let layout = compute_layout(&parsed.model, kind, &LayoutConfig::default());
    assert_eq!(layout.kind, DiagramKind::State);
    assert_eq!(layout.nodes.len(), 2);
    assert_eq!(layout.edges.len(), 1);
}

#[test]
fn nested_activations_share_one_lifeline() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/sequence/self_and_nested.dgm");
    let (_, layout) = layout_fixture(&path);
    let bars: Vec<_> = layout
        .activations
        .iter()
        .filter(|bar| bar.participant == "Server")
        .collect();
    assert_eq!(bars.len(), 2);
    let (inner, outer) = if bars[0].height < bars[1].height {
        (bars[0], bars[1])
    } else {
        (bars[1], bars[0])
    };
    assert_eq!(inner.x, outer.x);
    assert!(inner.y >= outer.y && inner.y + inner.height <= outer.y + outer.height);
    assert!(layout.edges.iter().any(|edge| edge.self_loop));
}
