use indexmap::IndexMap;

use super::label_placement::LabelPlacement;
use super::text::TextDirection;
use crate::geometry::{Obstacle, Point, Rect};
use crate::ir::{DiagramKind, Marker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Actor,
    UseCase,
    Participant,
    Class,
    State,
    Start,
    End,
}

impl NodeShape {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeShape::Actor => "actor",
            NodeShape::UseCase => "usecase",
            NodeShape::Participant => "participant",
            NodeShape::Class => "class",
            NodeShape::State => "state",
            NodeShape::Start => "start",
            NodeShape::End => "end",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub direction: TextDirection,
}

impl NodeLayout {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowHead {
    Sync,
    Async,
}

impl ArrowHead {
    pub fn for_async(is_async: bool) -> Self {
        if is_async {
            ArrowHead::Async
        } else {
            ArrowHead::Sync
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub id: String,
    pub from: String,
    pub to: String,
    pub points: Vec<Point>,
    pub label: Option<String>,
    /// Where a renderer should draw `label` when no placement was searched.
    pub label_anchor: Option<Point>,
    pub label_placement: Option<LabelPlacement>,
    pub arrow_end: Option<ArrowHead>,
    pub marker_start: Option<Marker>,
    pub marker_end: Option<Marker>,
    pub self_loop: bool,
}

impl EdgeLayout {
    pub(crate) fn new(id: &str, from: &str, to: &str, points: Vec<Point>) -> Self {
        Self {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            points,
            label: None,
            label_anchor: None,
            label_placement: None,
            arrow_end: None,
            marker_start: None,
            marker_end: None,
            self_loop: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lifeline {
    pub participant: String,
    pub x: f32,
    pub y1: f32,
    pub y2: f32,
}

#[derive(Debug, Clone)]
pub struct ActivationBox {
    pub id: String,
    pub participant: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassSection {
    Attributes,
    Methods,
}

#[derive(Debug, Clone)]
pub struct ClassRow {
    pub section: ClassSection,
    /// Member text already shortened to the node width.
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub direction: TextDirection,
}

#[derive(Debug, Clone)]
pub struct ClassCompartments {
    pub class: String,
    pub title: Point,
    pub header_divider_y: f32,
    pub members_divider_y: f32,
    pub rows: Vec<ClassRow>,
}

/// A positioned scene for one dialect.
#[derive(Debug, Clone)]
pub struct Layout {
    pub kind: DiagramKind,
    pub width: f32,
    pub height: f32,
    pub nodes: IndexMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub lifelines: Vec<Lifeline>,
    pub activations: Vec<ActivationBox>,
    pub class_compartments: Vec<ClassCompartments>,
}

impl Layout {
    pub(crate) fn new(kind: DiagramKind) -> Self {
        Self {
            kind,
            width: 0.0,
            height: 0.0,
            nodes: IndexMap::new(),
            edges: Vec::new(),
            lifelines: Vec::new(),
            activations: Vec::new(),
            class_compartments: Vec::new(),
        }
    }

    pub(crate) fn insert_node(&mut self, node: NodeLayout) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.get(id)
    }

    /// Every node's box, owned by its id.
    pub(crate) fn node_obstacles(&self) -> Vec<Obstacle> {
        self.nodes
            .values()
            .map(|node| Obstacle::new(node.id.clone(), node.rect()))
            .collect()
    }
}
