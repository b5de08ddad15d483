use crate::ir::{
    ActivationCommand, Activation, Association, ClassRelation, DetectedType, DiagramKind,
    DiagramModel, Message, ParseResult, RelationKind, SequenceCommand, Transition, PSEUDO_STATE,
};
use indexmap::IndexMap;
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*//.*$").unwrap());
static HASH_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+#.*$").unwrap());
static CLASS_INLINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^class\s+([A-Za-z0-9_\x{0600}-\x{06FF}]+)\s*\{(.*)\}$").unwrap()
});
static CLASS_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^class\s+([A-Za-z0-9_\x{0600}-\x{06FF}]+)\s*\{$").unwrap());
static CLASS_RELATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([A-Za-z0-9_\x{0600}-\x{06FF}]+)\s*(<\|--|\*--|o--|--)\s*([A-Za-z0-9_\x{0600}-\x{06FF}]+)$",
    )
    .unwrap()
});
static ACTIVATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(activate|deactivate)\s+(.+)$").unwrap());
static USE_CASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*--?>\s*\((.+?)\)$").unwrap());
static STATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(.+?)\]\s*--?>\s*\[(.+?)\](?:\s*:\s*(.+))?$").unwrap()
});
static SEQUENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*(--?>)\s*(.+?)\s*:\s*(.+)$").unwrap());

/// Mutable state threaded through one `parse` call.
#[derive(Debug, Default)]
struct ParseContext {
    line_number: usize,
    model: DiagramModel,
    errors: Vec<String>,
    open_class: Option<String>,
    activation_stacks: IndexMap<String, Vec<usize>>,
}

struct LineRule {
    name: &'static str,
    apply: fn(&mut ParseContext, &str) -> bool,
}

// Priority order decides between syntactically overlapping forms; keep it as is.
const LINE_RULES: [LineRule; 8] = [
    LineRule {
        name: "class-body",
        apply: apply_class_body,
    },
    LineRule {
        name: "class-inline",
        apply: apply_class_inline,
    },
    LineRule {
        name: "class-open",
        apply: apply_class_open,
    },
    LineRule {
        name: "class-relation",
        apply: apply_class_relation,
    },
    LineRule {
        name: "activation",
        apply: apply_activation,
    },
    LineRule {
        name: "usecase",
        apply: apply_use_case,
    },
    LineRule {
        name: "state",
        apply: apply_state_transition,
    },
    LineRule {
        name: "sequence",
        apply: apply_sequence_message,
    },
];

/// Parses diagram text into every dialect's model at once.
///
/// Never fails: lines that match no rule are reported in
/// [`ParseResult::errors`] with their 1-based line number and parsing moves on.
pub fn parse(input: &str) -> ParseResult {
    let mut ctx = ParseContext::default();

    for (idx, raw_line) in input.lines().enumerate() {
        let line = normalize_line(raw_line);
        if line.is_empty() {
            continue;
        }
        ctx.line_number = idx + 1;
        match LINE_RULES.iter().find(|rule| (rule.apply)(&mut ctx, &line)) {
            Some(rule) => trace!(line = ctx.line_number, rule = rule.name; "matched line"),
            None => ctx.errors.push(format!(
                "Line {}: could not parse \"{}\".",
                ctx.line_number, line
            )),
        }
    }

    finish(&mut ctx);

    let (detected_type, candidate_types) = detect_diagram_type(&ctx.model);
    debug!(
        detected = detected_type.as_str(),
        candidates:? = candidate_types,
        errors = ctx.errors.len();
        "parsed diagram text"
    );
    ParseResult {
        detected_type,
        candidate_types,
        model: ctx.model,
        errors: ctx.errors,
    }
}

fn normalize_line(raw: &str) -> String {
    let without_slashes = LINE_COMMENT_RE.replace(raw, "");
    let without_hash = HASH_COMMENT_RE.replace(&without_slashes, "");
    without_hash.trim().to_string()
}

fn finish(ctx: &mut ParseContext) {
    if let Some(name) = ctx.open_class.take() {
        ctx.errors
            .push(format!("Unclosed class block for \"{}\".", name));
    }

    let message_count = ctx.model.sequence.messages.len();
    let stacks = std::mem::take(&mut ctx.activation_stacks);
    for (participant, stack) in stacks {
        for start_index in stack {
            ctx.errors.push(format!(
                "Activation for \"{}\" was never deactivated; closed at message {}.",
                participant, message_count
            ));
            push_activation(ctx, &participant, start_index, message_count);
        }
    }
}

fn push_activation(ctx: &mut ParseContext, participant: &str, start_index: usize, end_index: usize) {
    let activations = &mut ctx.model.sequence.activations;
    let id = format!("activation-{}", activations.len() + 1);
    activations.push(Activation {
        id,
        participant: participant.to_string(),
        start_index,
        end_index,
    });
}

fn apply_class_body(ctx: &mut ParseContext, line: &str) -> bool {
    let Some(name) = ctx.open_class.clone() else {
        return false;
    };
    let class = ctx.model.class.ensure_class(&name);
    match line.find('}') {
        Some(close) => {
            class.add_member(&line[..close]);
            ctx.open_class = None;
        }
        None => class.add_member(line),
    }
    true
}

fn apply_class_inline(ctx: &mut ParseContext, line: &str) -> bool {
    let Some(caps) = CLASS_INLINE_RE.captures(line) else {
        return false;
    };
    let class = ctx.model.class.ensure_class(&caps[1]);
    for member in caps[2].split(';') {
        class.add_member(member);
    }
    true
}

fn apply_class_open(ctx: &mut ParseContext, line: &str) -> bool {
    let Some(caps) = CLASS_OPEN_RE.captures(line) else {
        return false;
    };
    let name = caps[1].to_string();
    ctx.model.class.ensure_class(&name);
    ctx.open_class = Some(name);
    true
}

fn apply_class_relation(ctx: &mut ParseContext, line: &str) -> bool {
    let Some(caps) = CLASS_RELATION_RE.captures(line) else {
        return false;
    };
    let Some(kind) = RelationKind::from_token(&caps[2]) else {
        return false;
    };
    let (left, right) = (&caps[1], &caps[3]);
    // `Parent <|-- Child` is stored child -> parent.
    let (from, to) = match kind {
        RelationKind::Inheritance => (right, left),
        _ => (left, right),
    };
    let class = &mut ctx.model.class;
    class.ensure_class(from);
    class.ensure_class(to);
    let (marker_start, marker_end) = kind.markers();
    let id = format!("class-relation-{}", class.relations.len() + 1);
    class.relations.push(ClassRelation {
        id,
        from: from.to_string(),
        to: to.to_string(),
        kind,
        marker_start,
        marker_end,
    });
    true
}

fn apply_activation(ctx: &mut ParseContext, line: &str) -> bool {
    let Some(caps) = ACTIVATION_RE.captures(line) else {
        return false;
    };
    let command = if caps[1].eq_ignore_ascii_case("activate") {
        ActivationCommand::Activate
    } else {
        ActivationCommand::Deactivate
    };
    let participant = caps[2].trim().to_string();
    let message_count = ctx.model.sequence.messages.len();

    let sequence = &mut ctx.model.sequence;
    sequence.participants.insert(participant.clone());
    let id = format!("seq-command-{}", sequence.commands.len() + 1);
    sequence.commands.push(SequenceCommand {
        id,
        command,
        participant: participant.clone(),
        at_message_index: message_count,
    });

    match command {
        ActivationCommand::Activate => {
            ctx.activation_stacks
                .entry(participant)
                .or_default()
                .push(message_count);
        }
        ActivationCommand::Deactivate => {
            let start = ctx
                .activation_stacks
                .get_mut(&participant)
                .and_then(|stack| stack.pop());
            match start {
                Some(start_index) => {
                    push_activation(ctx, &participant, start_index, message_count)
                }
                None => ctx.errors.push(format!(
                    "Line {}: deactivate without matching activate for \"{}\".",
                    ctx.line_number, participant
                )),
            }
        }
    }
    true
}

fn apply_use_case(ctx: &mut ParseContext, line: &str) -> bool {
    let Some(caps) = USE_CASE_RE.captures(line) else {
        return false;
    };
    let actor = caps[1].trim().to_string();
    let use_case = caps[2].trim().to_string();
    let diagram = &mut ctx.model.use_case;
    diagram.actors.insert(actor.clone());
    diagram.use_cases.insert(use_case.clone());
    let id = format!("usecase-association-{}", diagram.associations.len() + 1);
    diagram.associations.push(Association {
        id,
        actor,
        use_case,
        is_async: line.contains("-->"),
    });
    true
}

fn apply_state_transition(ctx: &mut ParseContext, line: &str) -> bool {
    let Some(caps) = STATE_RE.captures(line) else {
        return false;
    };
    let from = caps[1].trim().to_string();
    let to = caps[2].trim().to_string();
    let label = caps
        .get(3)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let diagram = &mut ctx.model.state;
    for endpoint in [&from, &to] {
        if endpoint != PSEUDO_STATE {
            diagram.states.insert(endpoint.clone());
        }
    }
    let id = format!("state-transition-{}", diagram.transitions.len() + 1);
    diagram.transitions.push(Transition {
        id,
        from,
        to,
        label,
        is_async: line.contains("-->"),
    });
    true
}

fn apply_sequence_message(ctx: &mut ParseContext, line: &str) -> bool {
    let Some(caps) = SEQUENCE_RE.captures(line) else {
        return false;
    };
    let from = caps[1].trim().to_string();
    let to = caps[3].trim().to_string();
    let text = caps[4].trim().to_string();
    let diagram = &mut ctx.model.sequence;
    diagram.participants.insert(from.clone());
    diagram.participants.insert(to.clone());
    let id = format!("sequence-message-{}", diagram.messages.len() + 1);
    diagram.messages.push(Message {
        id,
        from,
        to,
        text,
        is_async: &caps[2] == "-->",
    });
    true
}

/// Detection score of one dialect; higher means more content of that dialect.
pub fn dialect_score(model: &DiagramModel, kind: DiagramKind) -> usize {
    match kind {
        DiagramKind::UseCase => model.use_case.associations.len(),
        DiagramKind::Sequence => model.sequence.messages.len() + model.sequence.activations.len(),
        DiagramKind::Class => {
            let members: usize = model
                .class
                .classes
                .values()
                .map(|class| class.member_count())
                .sum();
            model.class.classes.len() * 2 + model.class.relations.len() + members
        }
        DiagramKind::State => model.state.transitions.len(),
    }
}

fn detect_diagram_type(model: &DiagramModel) -> (DetectedType, Vec<DiagramKind>) {
    let scores: Vec<(DiagramKind, usize)> = DiagramKind::ALL
        .iter()
        .map(|&kind| (kind, dialect_score(model, kind)))
        .collect();
    let candidates: Vec<DiagramKind> = scores
        .iter()
        .filter(|(_, score)| *score > 0)
        .map(|(kind, _)| *kind)
        .collect();
    if candidates.is_empty() {
        return (DetectedType::Unknown, candidates);
    }

    let mut ranked = scores;
    // Stable, so equal scores keep the fixed dialect order.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let (top_kind, top_score) = ranked[0];
    let second_score = ranked.get(1).map(|(_, score)| *score).unwrap_or(0);
    if second_score == top_score {
        return (DetectedType::Mixed, candidates);
    }
    (DetectedType::Kind(top_kind), candidates)
}

/// Picks the dialect to lay out: an explicit selection wins, a mixed detection
/// falls back to its first candidate, an unknown one yields nothing.
pub fn resolve_active_kind(
    result: &ParseResult,
    selection: Option<DiagramKind>,
) -> Option<DiagramKind> {
    if selection.is_some() {
        return selection;
    }
    match result.detected_type {
        DetectedType::Kind(kind) => Some(kind),
        DetectedType::Mixed => result.candidate_types.first().copied(),
        DetectedType::Unknown => None,
    }
}
