use crate::config::load_config;
use crate::ir::DiagramKind;
use crate::layout::compute_layout;
use crate::layout_dump::{write_json, LayoutDump};
use crate::parser::{parse, resolve_active_kind};
use crate::samples;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "dgrm",
    version,
    about = "Lay out use-case, sequence, class and state diagrams as routed JSON geometry"
)]
pub struct Args {
    /// Input file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output JSON file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Diagram type; `auto` uses detection
    #[arg(short = 't', long = "type", value_enum, default_value = "auto")]
    pub diagram_type: TypeArg,

    /// Layout config file (.json or .json5)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Use a built-in sample instead of reading input
    #[arg(long = "sample", value_enum, conflicts_with = "input")]
    pub sample: Option<KindArg>,

    /// Only parse; write the parse result
    #[arg(long = "parse-only")]
    pub parse_only: bool,

    /// Pretty-print JSON
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Usecase,
    Sequence,
    Class,
    State,
}

impl From<KindArg> for DiagramKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Usecase => DiagramKind::UseCase,
            KindArg::Sequence => DiagramKind::Sequence,
            KindArg::Class => DiagramKind::Class,
            KindArg::State => DiagramKind::State,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeArg {
    Auto,
    Usecase,
    Sequence,
    Class,
    State,
}

impl TypeArg {
    fn selection(self) -> Option<DiagramKind> {
        match self {
            TypeArg::Auto => None,
            TypeArg::Usecase => Some(KindArg::Usecase.into()),
            TypeArg::Sequence => Some(KindArg::Sequence.into()),
            TypeArg::Class => Some(KindArg::Class.into()),
            TypeArg::State => Some(KindArg::State.into()),
        }
    }
}

pub fn run(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;

    let input = match args.sample {
        Some(kind) => samples::sample(kind.into()).to_string(),
        None => read_input(args.input.as_deref())?,
    };

    let result = parse(&input);
    for error in &result.errors {
        warn!("{error}");
    }
    info!(
        detected = result.detected_type.as_str(),
        candidates:? = result.candidate_types;
        "parsed input"
    );

    let output = args.output.as_deref();
    if args.parse_only {
        write_json(&result, output, args.pretty).context("writing parse result")?;
        return Ok(());
    }

    let Some(kind) = resolve_active_kind(&result, args.diagram_type.selection()) else {
        warn!("no diagram type could be detected; writing the parse result only");
        write_json(&result, output, args.pretty).context("writing parse result")?;
        return Ok(());
    };

    let layout = compute_layout(&result.model, kind, &config);
    let dump = LayoutDump::from_layout(&layout, &result);
    write_json(&dump, output, args.pretty).context("writing layout")?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
    }

    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading stdin")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "dgrm",
            "--sample",
            "state",
            "-t",
            "class",
            "--pretty",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.sample, Some(KindArg::State));
        assert_eq!(args.diagram_type.selection(), Some(DiagramKind::Class));
        assert!(args.pretty);
        assert_eq!(args.log_level, "debug");
    }

    #[test]
    fn auto_type_defers_to_detection() {
        let args = Args::try_parse_from(["dgrm"]).unwrap();
        assert_eq!(args.diagram_type, TypeArg::Auto);
        assert_eq!(args.diagram_type.selection(), None);
        assert_eq!(args.log_level, "warn");
    }

    #[test]
    fn sample_conflicts_with_input() {
        assert!(Args::try_parse_from(["dgrm", "--sample", "class", "-i", "x.dgm"]).is_err());
    }

    #[test]
    fn writes_layout_for_sample() {
        let dir = std::env::temp_dir().join(format!("dgrm-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let out = dir.join("state.json");
        let args = Args::try_parse_from([
            "dgrm",
            "--sample",
            "state",
            "-o",
            out.to_str().unwrap(),
        ])
        .unwrap();
        run(&args).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["kind"], "state");
        std::fs::remove_dir_all(&dir).ok();
    }
}
