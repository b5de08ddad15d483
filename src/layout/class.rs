use std::collections::{BTreeMap, HashMap, VecDeque};

use indexmap::IndexMap;
use log::{debug, trace};

use super::anchors::{select_anchors, side_anchor};
use super::routing::route_orthogonal;
use super::text::{estimate_text_width, fit_text_to_width, text_direction, TextDirection};
use super::types::{ClassCompartments, ClassRow, ClassSection, EdgeLayout, Layout, NodeLayout, NodeShape};
use crate::config::{ClassConfig, LayoutConfig};
use crate::geometry::{obstacles_excluding, Point, Rect, Side};
use crate::ir::{ClassDiagram, ClassNode, DiagramKind, RelationKind};

const EMPTY_SECTION: &str = "-";

#[derive(Debug, Clone, Copy)]
struct ClassSize {
    width: f32,
    height: f32,
}

fn class_size(node: &ClassNode, cfg: &ClassConfig) -> ClassSize {
    let widest = std::iter::once(&node.name)
        .chain(&node.attributes)
        .chain(&node.methods)
        .map(|text| estimate_text_width(text, &cfg.char_widths))
        .fold(cfg.min_text_width, f32::max);
    let width = (widest + cfg.text_padding)
        .ceil()
        .min(cfg.max_width)
        .max(cfg.min_width);
    let attribute_rows = node.attributes.len().max(1) as f32;
    let method_rows = node.methods.len().max(1) as f32;
    let height = cfg.header_height
        + attribute_rows * cfg.row_height
        + method_rows * cfg.row_height
        + cfg.footer_height;
    ClassSize { width, height }
}

/// Inheritance edges between known classes, as child → parents and
/// parent → children, both in relation order.
struct Inheritance<'a> {
    parents: HashMap<&'a str, Vec<&'a str>>,
    children: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Inheritance<'a> {
    fn new(diagram: &'a ClassDiagram) -> Self {
        let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for relation in &diagram.relations {
            if relation.kind != RelationKind::Inheritance {
                continue;
            }
            let child = relation.from.as_str();
            let parent = relation.to.as_str();
            if !diagram.classes.contains_key(child) || !diagram.classes.contains_key(parent) {
                continue;
            }
            children.entry(parent).or_default().push(child);
            parents.entry(child).or_default().push(parent);
        }
        Self { parents, children }
    }

    fn parents_of(&self, id: &str) -> &[&'a str] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn children_of(&self, id: &str) -> &[&'a str] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Level of every class: roots at 0, children below their deepest parent,
/// and anything unreachable from a root appended past the deepest level.
///
/// Returns `None` when no class is a root (every class has a parent).
fn assign_levels<'a>(
    diagram: &'a ClassDiagram,
    inheritance: &Inheritance<'a>,
) -> Option<HashMap<&'a str, usize>> {
    let roots: Vec<&str> = diagram
        .classes
        .keys()
        .map(String::as_str)
        .filter(|id| inheritance.parents_of(id).is_empty())
        .collect();
    if roots.is_empty() {
        return None;
    }

    // No acyclic chain is deeper than the class count, so capping levels
    // there stops cycles below a root from growing forever.
    let level_cap = diagram.classes.len();
    let mut levels: HashMap<&str, usize> = roots.iter().map(|root| (*root, 0)).collect();
    let mut queue: VecDeque<&str> = roots.into_iter().collect();
    while let Some(parent) = queue.pop_front() {
        let proposed = levels[parent] + 1;
        if proposed >= level_cap {
            continue;
        }
        for &child in inheritance.children_of(parent) {
            if levels.get(child).is_none_or(|&level| proposed > level) {
                levels.insert(child, proposed);
                queue.push_back(child);
            }
        }
    }

    let mut max_level = levels.values().copied().max().unwrap_or(0);
    for id in diagram.classes.keys() {
        if !levels.contains_key(id.as_str()) {
            max_level += 1;
            levels.insert(id.as_str(), max_level);
        }
    }
    Some(levels)
}

fn hierarchical_positions(
    diagram: &ClassDiagram,
    sizes: &HashMap<&str, ClassSize>,
    cfg: &ClassConfig,
) -> Option<HashMap<String, Point>> {
    let has_inheritance = diagram
        .relations
        .iter()
        .any(|relation| relation.kind == RelationKind::Inheritance);
    if !has_inheritance {
        return None;
    }
    let inheritance = Inheritance::new(diagram);
    let levels = assign_levels(diagram, &inheritance)?;

    let mut by_level: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for id in diagram.classes.keys() {
        by_level.entry(levels[id.as_str()]).or_default().push(id.as_str());
    }

    let mut order_index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<Vec<&str>> = Vec::with_capacity(by_level.len());
    for (level_idx, (_, mut ids)) in by_level.into_iter().enumerate() {
        if level_idx == 0 {
            ids.sort();
        } else {
            let mean_parent_order = |id: &str| {
                let parents = inheritance.parents_of(id);
                let sum: usize = parents
                    .iter()
                    .map(|parent| order_index.get(parent).copied().unwrap_or(0))
                    .sum();
                sum as f32 / parents.len().max(1) as f32
            };
            ids.sort_by(|a, b| {
                mean_parent_order(a)
                    .total_cmp(&mean_parent_order(b))
                    .then_with(|| a.cmp(b))
            });
        }
        for (idx, &id) in ids.iter().enumerate() {
            order_index.insert(id, idx);
        }
        rows.push(ids);
    }

    let level_width = |ids: &[&str]| {
        let nodes: f32 = ids.iter().map(|id| sizes[id].width).sum();
        nodes + ids.len().saturating_sub(1) as f32 * cfg.horizontal_gap
    };
    let widest_level = rows
        .iter()
        .map(|ids| level_width(ids))
        .fold(cfg.min_level_width, f32::max);

    let mut positions = HashMap::new();
    let mut y = cfg.start_y;
    for ids in &rows {
        let mut x = cfg.start_x + (widest_level - level_width(ids)) / 2.0;
        let mut tallest = 0.0f32;
        for id in ids {
            let size = sizes[id];
            positions.insert(id.to_string(), Point::new(x, y));
            x += size.width + cfg.horizontal_gap;
            tallest = tallest.max(size.height);
        }
        y += tallest + cfg.vertical_gap;
    }
    Some(positions)
}

fn grid_positions(
    diagram: &ClassDiagram,
    sizes: &HashMap<&str, ClassSize>,
    cfg: &ClassConfig,
) -> HashMap<String, Point> {
    let count = diagram.classes.len();
    let columns = ((count.max(1) as f32).sqrt().ceil() as usize).max(1);
    let ids: Vec<&str> = diagram.classes.keys().map(String::as_str).collect();

    let mut positions = HashMap::new();
    let mut y = cfg.grid_start_y;
    for row in ids.chunks(columns) {
        let mut tallest = 0.0f32;
        for (col, id) in row.iter().enumerate() {
            let x = cfg.start_x + col as f32 * (cfg.grid_column_width + cfg.horizontal_gap);
            positions.insert(id.to_string(), Point::new(x, y));
            tallest = tallest.max(sizes[id].height);
        }
        y += tallest + cfg.grid_vertical_gap;
    }
    positions
}

fn member_rows(
    node: &NodeLayout,
    members: &[String],
    section: ClassSection,
    top: f32,
    cfg: &ClassConfig,
) -> Vec<ClassRow> {
    let placeholder = [EMPTY_SECTION.to_string()];
    let members = if members.is_empty() {
        &placeholder[..]
    } else {
        members
    };
    members
        .iter()
        .enumerate()
        .map(|(idx, member)| {
            let direction = text_direction(member);
            let x = match direction {
                TextDirection::Rtl => node.x + node.width - cfg.text_inset,
                TextDirection::Ltr => node.x + cfg.text_inset,
            };
            ClassRow {
                section,
                text: fit_text_to_width(member, node.width - 2.0 * cfg.text_inset, &cfg.char_widths),
                x,
                y: top + cfg.row_baseline + idx as f32 * cfg.row_height,
                direction,
            }
        })
        .collect()
}

fn compartments(node: &NodeLayout, class: &ClassNode, cfg: &ClassConfig) -> ClassCompartments {
    let header_divider_y = node.y + cfg.divider_offset;
    let members_divider_y =
        header_divider_y + class.attributes.len().max(1) as f32 * cfg.row_height;
    let mut rows = member_rows(
        node,
        &class.attributes,
        ClassSection::Attributes,
        header_divider_y,
        cfg,
    );
    rows.extend(member_rows(
        node,
        &class.methods,
        ClassSection::Methods,
        members_divider_y,
        cfg,
    ));
    ClassCompartments {
        class: class.name.clone(),
        title: Point::new(node.x + node.width / 2.0, node.y + cfg.title_baseline),
        header_divider_y,
        members_divider_y,
        rows,
    }
}

/// Rank and sibling count of each inheritance relation among its parent's
/// children, ordered by child centre x.
fn sibling_slots(diagram: &ClassDiagram, layout: &Layout) -> HashMap<String, (usize, usize)> {
    let mut by_parent: IndexMap<&str, Vec<(&str, f32)>> = IndexMap::new();
    for relation in &diagram.relations {
        if relation.kind != RelationKind::Inheritance {
            continue;
        }
        let child_x = layout
            .node(&relation.from)
            .map(|node| node.center().x)
            .unwrap_or(0.0);
        by_parent
            .entry(relation.to.as_str())
            .or_default()
            .push((relation.id.as_str(), child_x));
    }

    let mut slots = HashMap::new();
    for group in by_parent.values_mut() {
        group.sort_by(|a, b| a.1.total_cmp(&b.1));
        let total = group.len();
        for (idx, (id, _)) in group.iter().enumerate() {
            slots.insert(id.to_string(), (idx, total));
        }
    }
    slots
}

pub(crate) fn layout_class(diagram: &ClassDiagram, config: &LayoutConfig) -> Layout {
    let cfg = &config.class;
    let mut layout = Layout::new(DiagramKind::Class);

    let sizes: HashMap<&str, ClassSize> = diagram
        .classes
        .iter()
        .map(|(id, node)| (id.as_str(), class_size(node, cfg)))
        .collect();
    let positions = match hierarchical_positions(diagram, &sizes, cfg) {
        Some(positions) => positions,
        None => {
            debug!(classes = diagram.classes.len(); "class layout using grid placement");
            grid_positions(diagram, &sizes, cfg)
        }
    };

    for (id, class) in &diagram.classes {
        let size = sizes[id.as_str()];
        let origin = positions.get(id).copied().unwrap_or_default();
        let node = NodeLayout {
            id: id.clone(),
            label: class.name.clone(),
            shape: NodeShape::Class,
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            direction: text_direction(&class.name),
        };
        layout.class_compartments.push(compartments(&node, class, cfg));
        layout.insert_node(node);
    }

    let max_x = layout
        .nodes
        .values()
        .map(|node| node.rect().right())
        .fold(cfg.min_canvas_width, f32::max);
    let max_y = layout
        .nodes
        .values()
        .map(|node| node.rect().bottom())
        .fold(cfg.min_canvas_height, f32::max);
    layout.width = max_x + cfg.canvas_margin;
    layout.height = max_y + cfg.canvas_margin;

    let slots = sibling_slots(diagram, &layout);
    let obstacles = layout.node_obstacles();
    for relation in &diagram.relations {
        let (Some(source), Some(target)) = (layout.node(&relation.from), layout.node(&relation.to))
        else {
            trace!(edge = relation.id.as_str(); "dropping relation with missing class");
            continue;
        };
        let source_rect: Rect = source.rect();
        let target_rect: Rect = target.rect();

        let (start, end) = if relation.kind == RelationKind::Inheritance {
            let (idx, total) = slots.get(&relation.id).copied().unwrap_or((0, 1));
            let ratio = (idx + 1) as f32 / (total + 1) as f32;
            if target_rect.bottom() <= source_rect.y {
                (
                    side_anchor(&source_rect, Side::Top, 0.5),
                    side_anchor(&target_rect, Side::Bottom, ratio),
                )
            } else {
                (
                    side_anchor(&source_rect, Side::Bottom, 0.5),
                    side_anchor(&target_rect, Side::Top, ratio),
                )
            }
        } else {
            select_anchors(&source_rect, &target_rect, &config.anchor)
        };

        let others = obstacles_excluding(&obstacles, &[relation.from.as_str(), relation.to.as_str()]);
        let points = route_orthogonal(&start, &end, &others, &cfg.route, &config.router);
        let mut edge = EdgeLayout::new(&relation.id, &relation.from, &relation.to, points);
        edge.marker_start = relation.marker_start;
        edge.marker_end = relation.marker_end;
        layout.edges.push(edge);
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Marker;
    use crate::parser::parse;

    fn layout_for(input: &str) -> Layout {
        let result = parse(input);
        layout_class(&result.model.class, &LayoutConfig::default())
    }

    #[test]
    fn width_is_clamped_and_height_counts_rows() {
        let cfg = ClassConfig::default();
        let mut node = ClassNode {
            name: "A".to_string(),
            ..ClassNode::default()
        };
        let size = class_size(&node, &cfg);
        assert_eq!(size.width, 250.0);
        assert_eq!(size.height, 48.0 + 24.0 + 24.0 + 8.0);

        node.add_member(&"x".repeat(80));
        node.add_member("a()");
        node.add_member("b()");
        let size = class_size(&node, &cfg);
        assert_eq!(size.width, 320.0);
        assert_eq!(size.height, 48.0 + 24.0 + 48.0 + 8.0);
    }

    #[test]
    fn parents_sit_above_children() {
        let layout = layout_for("class Animal {}\nAnimal <|-- Dog\nAnimal <|-- Cat\nDog <|-- Puppy");
        let y = |id: &str| layout.node(id).unwrap().y;
        assert_eq!(y("Animal"), 90.0);
        assert!(y("Animal") < y("Dog"));
        assert_eq!(y("Dog"), y("Cat"));
        assert!(y("Dog") < y("Puppy"));
    }

    #[test]
    fn level_takes_the_deepest_parent() {
        let layout = layout_for("B <|-- A\nC <|-- B\nC <|-- A");
        let y = |id: &str| layout.node(id).unwrap().y;
        assert!(y("C") < y("B"));
        assert!(y("B") < y("A"));
    }

    #[test]
    fn roots_are_sorted_and_levels_centred() {
        let layout = layout_for("Zeta <|-- Child\nclass Alpha {}");
        let alpha = layout.node("Alpha").unwrap();
        let zeta = layout.node("Zeta").unwrap();
        let child = layout.node("Child").unwrap();
        assert!(alpha.x < zeta.x);
        assert_eq!(alpha.y, 90.0);
        assert_eq!(alpha.y, zeta.y);
        // Level 0 holds Alpha and Zeta (250 + 90 + 250); Child is centred under it.
        assert_eq!(alpha.x, 90.0);
        assert_eq!(child.x, 90.0 + (590.0 - 250.0) / 2.0);
    }

    #[test]
    fn tied_siblings_are_ordered_by_name() {
        let layout = layout_for("A <|-- C\nA <|-- B");
        let a = layout.node("A").unwrap();
        let b = layout.node("B").unwrap();
        let c = layout.node("C").unwrap();
        assert!(a.y < b.y);
        assert_eq!(b.y, c.y);
        assert!(b.x < c.x);
        assert_eq!(b.x, 90.0);
    }

    #[test]
    fn grid_fallback_without_inheritance() {
        let layout = layout_for("A *-- B\nC o-- D\nE -- A");
        let a = layout.node("A").unwrap();
        let b = layout.node("B").unwrap();
        let c = layout.node("C").unwrap();
        let d = layout.node("D").unwrap();
        assert_eq!((a.x, a.y), (90.0, 100.0));
        assert_eq!(b.x, 90.0 + 410.0);
        assert_eq!(c.x, 90.0 + 820.0);
        assert_eq!(d.x, 90.0);
        assert_eq!(d.y, 100.0 + a.height + 90.0);
    }

    #[test]
    fn inheritance_cycle_still_terminates() {
        let layout = layout_for("Root <|-- A\nA <|-- B\nB <|-- A");
        assert_eq!(layout.nodes.len(), 3);
        assert_eq!(layout.edges.len(), 3);
    }

    #[test]
    fn all_classes_with_parents_fall_back_to_grid() {
        let layout = layout_for("A <|-- B\nB <|-- A");
        assert_eq!(layout.node("A").unwrap().y, 100.0);
        assert_eq!(layout.node("B").unwrap().y, 100.0);
    }

    #[test]
    fn inheritance_edges_spread_along_the_parent() {
        let layout = layout_for("Base <|-- Left\nBase <|-- Right");
        let base = layout.node("Base").unwrap().rect();
        let ends: Vec<Point> = layout
            .edges
            .iter()
            .map(|edge| *edge.points.last().unwrap())
            .collect();
        let child_top = layout.node("Left").unwrap().y;
        for edge in &layout.edges {
            assert_eq!(edge.points[0].y, child_top);
        }
        let mut xs: Vec<f32> = ends.iter().map(|p| p.x).collect();
        xs.sort_by(f32::total_cmp);
        assert!((xs[0] - (base.x + base.width / 3.0)).abs() < 1e-3);
        assert!((xs[1] - (base.x + base.width * 2.0 / 3.0)).abs() < 1e-3);
        for end in &ends {
            assert_eq!(end.y, base.bottom());
        }
        assert_eq!(layout.edges[0].marker_end, Some(Marker::Triangle));
    }

    #[test]
    fn composition_uses_diamond_start() {
        let layout = layout_for("Car *-- Engine\nCar o-- Wheel");
        assert_eq!(layout.edges[0].marker_start, Some(Marker::Diamond));
        assert_eq!(layout.edges[1].marker_start, Some(Marker::HollowDiamond));
        assert_eq!(layout.edges[0].marker_end, None);
    }

    #[test]
    fn rows_use_placeholders_and_truncate() {
        let long = "x".repeat(60);
        let layout = layout_for(&format!("class A {{\n{long}\n}}"));
        let parts = &layout.class_compartments[0];
        let node = layout.node("A").unwrap();
        assert_eq!(parts.header_divider_y, node.y + 42.0);
        assert_eq!(parts.members_divider_y, node.y + 42.0 + 24.0);
        assert_eq!(parts.rows.len(), 2);
        assert!(parts.rows[0].text.ends_with("..."));
        assert_eq!(parts.rows[0].y, node.y + 42.0 + 18.0);
        assert_eq!(parts.rows[1].text, "-");
        assert_eq!(parts.rows[1].section, ClassSection::Methods);
        assert_eq!(parts.title, Point::new(node.x + node.width / 2.0, node.y + 27.0));
    }

    #[test]
    fn persian_rows_align_right() {
        let layout = layout_for("class Kar {\nنام: string\n}");
        let node = layout.node("Kar").unwrap();
        let row = &layout.class_compartments[0].rows[0];
        assert_eq!(row.direction, TextDirection::Rtl);
        assert_eq!(row.x, node.x + node.width - 12.0);
    }

    #[test]
    fn canvas_has_a_floor() {
        let layout = layout_for("");
        assert_eq!((layout.width, layout.height), (980.0, 540.0));
    }
}
