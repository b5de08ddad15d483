use diagram_engine::config::{RouteParams, RouterTuning};
use diagram_engine::geometry::{Anchor, Obstacle, Point, Rect, Side};
use diagram_engine::layout::route_orthogonal;
use diagram_engine::parse;
use proptest::prelude::*;

// ===================
// Strategies
// ===================

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![
        Just(Side::Top),
        Just(Side::Right),
        Just(Side::Bottom),
        Just(Side::Left),
    ]
}

fn anchor_strategy() -> impl Strategy<Value = Anchor> {
    (0.0f32..300.0, 0.0f32..300.0, side_strategy()).prop_map(|(x, y, side)| Anchor::new(x, y, side))
}

fn obstacles_strategy() -> impl Strategy<Value = Vec<Obstacle>> {
    prop::collection::vec(
        (0.0f32..300.0, 0.0f32..300.0, 10.0f32..120.0, 10.0f32..80.0),
        0..5,
    )
    .prop_map(|rects| {
        rects
            .into_iter()
            .enumerate()
            .map(|(idx, (x, y, w, h))| Obstacle::new(format!("block-{idx}"), Rect::new(x, y, w, h)))
            .collect()
    })
}

fn line_strategy() -> impl Strategy<Value = String> {
    let name = "n[A-Za-z0-9_]{0,6}";
    prop_oneof![
        (name, name).prop_map(|(a, b)| format!("{a} -> ({b})")),
        (name, name, name).prop_map(|(a, b, t)| format!("{a} -> {b}: {t}")),
        (name, name, name).prop_map(|(a, b, t)| format!("{a} --> {b}: {t}")),
        (name, name).prop_map(|(a, b)| format!("{a} <|-- {b}")),
        (name, name).prop_map(|(a, b)| format!("{a} *-- {b}")),
        (name, name).prop_map(|(a, b)| format!("[{a}] -> [{b}]")),
        name.prop_map(|a| format!("activate {a}")),
        name.prop_map(|a| format!("deactivate {a}")),
        name.prop_map(|a| format!("class {a} {{ +field: string; +run(): void }}")),
        Just("not a diagram line".to_string()),
    ]
}

// ===================
// Property Test Functions
// ===================

/// Routes start on the source anchor, end on the target anchor and only
/// turn at right angles.
fn check_route_contract(
    start: Anchor,
    end: Anchor,
    obstacles: &[Obstacle],
) -> Result<(), TestCaseError> {
    let params = RouteParams::new(10.0, 8.0, 12.0);
    let path = route_orthogonal(&start, &end, obstacles, &params, &RouterTuning::default());

    prop_assert!(!path.is_empty());
    prop_assert_eq!(path[0], start.point());
    prop_assert_eq!(path[path.len() - 1], end.point());
    for pair in path.windows(2) {
        let dx = (pair[0].x - pair[1].x).abs();
        let dy = (pair[0].y - pair[1].y).abs();
        prop_assert!(dx < 1e-3 || dy < 1e-3, "diagonal segment {:?}", pair);
        prop_assert!(!pair[0].approx_eq(pair[1]), "repeated point in {:?}", path);
    }
    Ok(())
}

/// Routing the same request twice gives the same path.
fn check_route_is_deterministic(
    start: Anchor,
    end: Anchor,
    obstacles: &[Obstacle],
) -> Result<(), TestCaseError> {
    let params = RouteParams::new(10.0, 8.0, 12.0);
    let tuning = RouterTuning::default();
    let a: Vec<Point> = route_orthogonal(&start, &end, obstacles, &params, &tuning);
    let b: Vec<Point> = route_orthogonal(&start, &end, obstacles, &params, &tuning);
    prop_assert_eq!(a, b);
    Ok(())
}

/// Every `activate` ends up as exactly one interval.
fn check_activation_balance(lines: &[String]) -> Result<(), TestCaseError> {
    let text = lines.join("\n");
    let result = parse(&text);
    let activates = lines
        .iter()
        .filter(|line| line.starts_with("activate "))
        .count();
    prop_assert_eq!(result.model.sequence.activations.len(), activates);
    prop_assert_eq!(parse(&text), result);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn route_contract(start in anchor_strategy(), end in anchor_strategy(), obstacles in obstacles_strategy()) {
        check_route_contract(start, end, &obstacles)?;
    }

    #[test]
    fn route_is_deterministic(start in anchor_strategy(), end in anchor_strategy(), obstacles in obstacles_strategy()) {
        check_route_is_deterministic(start, end, &obstacles)?;
    }

    #[test]
    fn activation_balance(lines in prop::collection::vec(line_strategy(), 0..24)) {
        check_activation_balance(&lines)?;
    }

    #[test]
    fn parse_never_panics(text in "\\PC{0,200}") {
        let _ = parse(&text);
    }
}
