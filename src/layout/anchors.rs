use crate::config::AnchorConfig;
use crate::geometry::{Anchor, Point, Rect, Side};

/// Anchor on `side` of `rect`, projected from `toward` and kept `inset` away
/// from the corners.
pub(crate) fn projected_anchor(rect: &Rect, side: Side, toward: Point, inset: f32) -> Anchor {
    // Plain min/max rather than clamp: rects narrower than twice the inset
    // invert the range and must fall back to the lower bound.
    if side.is_horizontal() {
        let y = toward.y.min(rect.bottom() - inset).max(rect.y + inset);
        let x = if side == Side::Left { rect.x } else { rect.right() };
        Anchor::new(x, y, side)
    } else {
        let x = toward.x.min(rect.right() - inset).max(rect.x + inset);
        let y = if side == Side::Top { rect.y } else { rect.bottom() };
        Anchor::new(x, y, side)
    }
}

/// Anchor on `side` of `rect` at `ratio` along that side.
pub(crate) fn side_anchor(rect: &Rect, side: Side, ratio: f32) -> Anchor {
    match side {
        Side::Top => Anchor::new(rect.x + rect.width * ratio, rect.y, side),
        Side::Bottom => Anchor::new(rect.x + rect.width * ratio, rect.bottom(), side),
        Side::Left => Anchor::new(rect.x, rect.y + rect.height * ratio, side),
        Side::Right => Anchor::new(rect.right(), rect.y + rect.height * ratio, side),
    }
}

fn score_anchor_pair(start: &Anchor, end: &Anchor, config: &AnchorConfig) -> f32 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let mut score = dx.abs() + dy.abs();

    let (snx, sny) = start.normal();
    if snx * dx + sny * dy < 0.0 {
        score += config.misfacing_penalty;
    }
    let (enx, eny) = end.normal();
    if enx * -dx + eny * -dy < 0.0 {
        score += config.misfacing_penalty;
    }
    if start.side.is_some() && start.side == end.side {
        score += config.same_side_penalty;
    }
    score
}

/// Picks the best pair of connection points between two rectangles.
///
/// All 16 side combinations are scored; the first strictly lowest score in
/// [`Side::SEARCH_ORDER`] order wins.
pub fn select_anchors(source: &Rect, target: &Rect, config: &AnchorConfig) -> (Anchor, Anchor) {
    let source_center = source.center();
    let target_center = target.center();
    let mut best_score = f32::INFINITY;
    let mut best = (
        projected_anchor(source, Side::Left, target_center, config.inset),
        projected_anchor(target, Side::Left, source_center, config.inset),
    );

    for source_side in Side::SEARCH_ORDER {
        let start = projected_anchor(source, source_side, target_center, config.inset);
        for target_side in Side::SEARCH_ORDER {
            let end = projected_anchor(target, target_side, source_center, config.inset);
            let score = score_anchor_pair(&start, &end, config);
            if score < best_score {
                best_score = score;
                best = (start, end);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_by_side_rects_face_each_other() {
        let config = AnchorConfig::default();
        let a = Rect::new(0.0, 0.0, 100.0, 60.0);
        let b = Rect::new(300.0, 0.0, 100.0, 60.0);
        let (start, end) = select_anchors(&a, &b, &config);
        assert_eq!(start.side, Some(Side::Right));
        assert_eq!(end.side, Some(Side::Left));
        assert_eq!((start.x, start.y), (100.0, 30.0));
        assert_eq!((end.x, end.y), (300.0, 30.0));
    }

    #[test]
    fn stacked_rects_use_top_and_bottom() {
        let config = AnchorConfig::default();
        let a = Rect::new(0.0, 0.0, 100.0, 60.0);
        let b = Rect::new(0.0, 300.0, 100.0, 60.0);
        let (start, end) = select_anchors(&a, &b, &config);
        assert_eq!(start.side, Some(Side::Bottom));
        assert_eq!(end.side, Some(Side::Top));
    }

    #[test]
    fn projection_is_clamped_inside_inset() {
        let rect = Rect::new(0.0, 0.0, 100.0, 60.0);
        let anchor = projected_anchor(&rect, Side::Right, Point::new(500.0, -400.0), 12.0);
        assert_eq!((anchor.x, anchor.y), (100.0, 12.0));
    }

    #[test]
    fn tiny_rect_projection_does_not_panic() {
        let rect = Rect::new(0.0, 0.0, 20.0, 20.0);
        let anchor = projected_anchor(&rect, Side::Top, Point::new(5.0, -50.0), 12.0);
        assert_eq!((anchor.x, anchor.y), (12.0, 0.0));
    }

    #[test]
    fn ratio_anchor_spreads_along_side() {
        let rect = Rect::new(0.0, 100.0, 200.0, 50.0);
        let anchor = side_anchor(&rect, Side::Bottom, 0.25);
        assert_eq!((anchor.x, anchor.y), (50.0, 150.0));
    }
}
