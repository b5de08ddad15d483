use crate::geometry::{Point, Rect};
use crate::ir::{DetectedType, DiagramKind, Marker, ParseResult};
use crate::layout::{ArrowHead, ClassSection, Layout, TextDirection};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Flat, renderer-facing view of a parse plus its laid-out scene.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub kind: DiagramKind,
    pub detected_type: DetectedType,
    pub candidate_types: Vec<DiagramKind>,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lifelines: Vec<LifelineDump>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activations: Vec<RectDump>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<ClassDump>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub shape: &'static str,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub direction: TextDirection,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub text: String,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<RectDump>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub from: String,
    pub to: String,
    pub points: Vec<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelDump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrow_end: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<Marker>,
    pub self_loop: bool,
}

#[derive(Debug, Serialize)]
pub struct LifelineDump {
    pub participant: String,
    pub x: f32,
    pub y1: f32,
    pub y2: f32,
}

#[derive(Debug, Serialize)]
pub struct RectDump {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<Rect> for RectDump {
    fn from(rect: Rect) -> Self {
        Self {
            id: None,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClassRowDump {
    pub section: &'static str,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub direction: TextDirection,
}

#[derive(Debug, Serialize)]
pub struct ClassDump {
    pub class: String,
    pub title: [f32; 2],
    pub header_divider_y: f32,
    pub members_divider_y: f32,
    pub rows: Vec<ClassRowDump>,
}

fn point(p: Point) -> [f32; 2] {
    [p.x, p.y]
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, result: &ParseResult) -> Self {
        let nodes = layout
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.clone(),
                label: node.label.clone(),
                shape: node.shape.as_str(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                direction: node.direction,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| {
                let label = edge.label.as_ref().and_then(|text| {
                    let at = edge.label_anchor?;
                    Some(LabelDump {
                        text: text.clone(),
                        x: at.x,
                        y: at.y,
                        rect: edge.label_placement.map(|placement| placement.rect.into()),
                    })
                });
                EdgeDump {
                    id: edge.id.clone(),
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    points: edge.points.iter().copied().map(point).collect(),
                    label,
                    arrow_end: edge.arrow_end.map(|arrow| match arrow {
                        ArrowHead::Sync => "sync",
                        ArrowHead::Async => "async",
                    }),
                    marker_start: edge.marker_start,
                    marker_end: edge.marker_end,
                    self_loop: edge.self_loop,
                }
            })
            .collect();

        let lifelines = layout
            .lifelines
            .iter()
            .map(|line| LifelineDump {
                participant: line.participant.clone(),
                x: line.x,
                y1: line.y1,
                y2: line.y2,
            })
            .collect();

        let activations = layout
            .activations
            .iter()
            .map(|bar| RectDump {
                id: Some(bar.id.clone()),
                x: bar.x,
                y: bar.y,
                width: bar.width,
                height: bar.height,
            })
            .collect();

        let classes = layout
            .class_compartments
            .iter()
            .map(|parts| ClassDump {
                class: parts.class.clone(),
                title: point(parts.title),
                header_divider_y: parts.header_divider_y,
                members_divider_y: parts.members_divider_y,
                rows: parts
                    .rows
                    .iter()
                    .map(|row| ClassRowDump {
                        section: match row.section {
                            ClassSection::Attributes => "attributes",
                            ClassSection::Methods => "methods",
                        },
                        text: row.text.clone(),
                        x: row.x,
                        y: row.y,
                        direction: row.direction,
                    })
                    .collect(),
            })
            .collect();

        LayoutDump {
            kind: layout.kind,
            detected_type: result.detected_type,
            candidate_types: result.candidate_types.clone(),
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
            lifelines,
            activations,
            classes,
            errors: result.errors.clone(),
        }
    }
}

/// Serialises `value` as JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>, pretty: bool) -> crate::Result<()> {
    let mut writer: BufWriter<Box<dyn Write>> = match path {
        Some(path) => BufWriter::new(Box::new(File::create(path)?)),
        None => BufWriter::new(Box::new(std::io::stdout().lock())),
    };
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
