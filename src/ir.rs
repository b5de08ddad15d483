use std::fmt;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};

/// Sentinel used as a transition endpoint for the pseudo-start / pseudo-end state.
pub const PSEUDO_STATE: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    UseCase,
    Sequence,
    Class,
    State,
}

impl DiagramKind {
    /// Fixed order used for scoring and candidate lists.
    pub const ALL: [DiagramKind; 4] = [
        DiagramKind::UseCase,
        DiagramKind::Sequence,
        DiagramKind::Class,
        DiagramKind::State,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UseCase => "usecase",
            Self::Sequence => "sequence",
            Self::Class => "class",
            Self::State => "state",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "usecase" | "use-case" | "use_case" => Some(Self::UseCase),
            "sequence" => Some(Self::Sequence),
            "class" => Some(Self::Class),
            "state" => Some(Self::State),
            _ => None,
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| crate::Error::UnknownKind(s.to_string()))
    }
}

/// Outcome of dialect auto-detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedType {
    Kind(DiagramKind),
    /// The two best nonzero scores tie; the caller picks among the candidates.
    Mixed,
    Unknown,
}

impl DetectedType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kind(kind) => kind.as_str(),
            Self::Mixed => "mixed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DetectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DetectedType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub id: String,
    pub actor: String,
    pub use_case: String,
    pub is_async: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UseCaseDiagram {
    pub actors: IndexSet<String>,
    pub use_cases: IndexSet<String>,
    pub associations: Vec<Association>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: String,
    pub from: String,
    pub to: String,
    pub text: String,
    pub is_async: bool,
}

/// Message-index range during which a participant is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub id: String,
    pub participant: String,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationCommand {
    Activate,
    Deactivate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceCommand {
    pub id: String,
    pub command: ActivationCommand,
    pub participant: String,
    pub at_message_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceDiagram {
    pub participants: IndexSet<String>,
    pub messages: Vec<Message>,
    pub activations: Vec<Activation>,
    pub commands: Vec<SequenceCommand>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassNode {
    pub name: String,
    pub attributes: Vec<String>,
    pub methods: Vec<String>,
}

impl ClassNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Files a member under methods when it looks like a call signature.
    pub fn add_member(&mut self, member: &str) {
        let member = member.trim();
        if member.is_empty() {
            return;
        }
        if member.contains('(') && member.contains(')') {
            self.methods.push(member.to_string());
        } else {
            self.attributes.push(member.to_string());
        }
    }

    pub fn member_count(&self) -> usize {
        self.attributes.len() + self.methods.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Inheritance,
    Composition,
    Aggregation,
    Association,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    Triangle,
    Diamond,
    HollowDiamond,
}

impl RelationKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "<|--" => Some(Self::Inheritance),
            "*--" => Some(Self::Composition),
            "o--" => Some(Self::Aggregation),
            "--" => Some(Self::Association),
            _ => None,
        }
    }

    /// Start / end markers drawn on the relation path.
    pub fn markers(self) -> (Option<Marker>, Option<Marker>) {
        match self {
            Self::Inheritance => (None, Some(Marker::Triangle)),
            Self::Composition => (Some(Marker::Diamond), None),
            Self::Aggregation => (Some(Marker::HollowDiamond), None),
            Self::Association => (None, None),
        }
    }
}

/// For inheritance `from` is the subclass and `to` the superclass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRelation {
    pub id: String,
    pub from: String,
    pub to: String,
    pub kind: RelationKind,
    pub marker_start: Option<Marker>,
    pub marker_end: Option<Marker>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassDiagram {
    pub classes: IndexMap<String, ClassNode>,
    pub relations: Vec<ClassRelation>,
}

impl ClassDiagram {
    pub fn ensure_class(&mut self, name: &str) -> &mut ClassNode {
        self.classes
            .entry(name.to_string())
            .or_insert_with(|| ClassNode::new(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: String,
    pub is_async: bool,
}

impl Transition {
    pub fn from_pseudo(&self) -> bool {
        self.from == PSEUDO_STATE
    }

    pub fn to_pseudo(&self) -> bool {
        self.to == PSEUDO_STATE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateDiagram {
    pub states: IndexSet<String>,
    pub transitions: Vec<Transition>,
}

/// Every dialect's sub-model; normally only one of them is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagramModel {
    pub use_case: UseCaseDiagram,
    pub sequence: SequenceDiagram,
    pub class: ClassDiagram,
    pub state: StateDiagram,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub detected_type: DetectedType,
    pub candidate_types: Vec<DiagramKind>,
    pub model: DiagramModel,
    pub errors: Vec<String>,
}
