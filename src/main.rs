//! Command-line front end: parse a node-definition document, value the
//! forest, and hand the DOT rendering to a file, stdout, or the xdot
//! viewer.

use std::fs;
use std::io::Read;
use std::io::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{CommandFactory, FromArgMatches, Parser};
use tracing_subscriber::EnvFilter;

use prospect::forest::Forest;
use prospect::model::Definitions;
use prospect::passes::value;
use prospect::render;

/// Built-in demo documents, embedded at compile time.
const DEMOS: &[(&str, &str)] = &[
    ("college", include_str!("../demos/college.yaml")),
    ("duedates", include_str!("../demos/duedates.yaml")),
    ("startup", include_str!("../demos/startup.yaml")),
];

#[derive(Parser, Debug)]
#[command(
    name = "prospect",
    about = "Value a tree of mutually-exclusive future decision paths"
)]
struct Cli {
    /// Set graphviz rankdir=TB (top to bottom)
    #[arg(long)]
    tb: bool,

    /// Input: 'stdin', 'demo:NAME', or a filename
    src: String,

    /// Output: 'stdout', 'yaml', 'xdot', or a filename
    dst: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Cli::command().after_help(demo_help()).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let buf = read_source(&cli.src)?;
    let defs = Definitions::from_yaml(&buf)?;
    let mut forest = Forest::from_definitions(&defs)?;

    value(&mut forest, Utc::now(), &mut |w| tracing::warn!("{w}"));
    let dot = render::to_dot(&forest, &mut |w| tracing::warn!("{w}"), cli.tb);

    match cli.dst.as_str() {
        "stdout" => print!("{dot}"),
        "yaml" => print!("{}", defs.to_yaml()?),
        "xdot" => run_xdot(&dot)?,
        path => write_with_backup(Path::new(path), &dot)?,
    }
    Ok(())
}

fn read_source(src: &str) -> Result<String> {
    if let Some(name) = src.strip_prefix("demo:") {
        return match DEMOS.iter().find(|(n, _)| *n == name) {
            Some((_, doc)) => Ok((*doc).to_string()),
            None => bail!("unknown demo '{name}'\n\n{}", demo_help()),
        };
    }
    if src == "stdin" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(src).with_context(|| format!("reading {src}"))
}

fn demo_help() -> String {
    let mut out = String::from("Demos available:\n\n");
    for (name, doc) in DEMOS {
        let desc = doc
            .lines()
            .next()
            .filter(|l| l.starts_with('#'))
            .unwrap_or("");
        out.push_str(&format!("  demo:{name:<12}{desc}\n"));
    }
    out
}

/// Writes DOT to a temp file and blocks on the xdot viewer.
fn run_xdot(dot: &str) -> Result<()> {
    let mut file = tempfile::Builder::new()
        .prefix("prospect.")
        .suffix(".dot")
        .tempfile()
        .context("creating temp file")?;
    file.write_all(dot.as_bytes())?;
    file.flush()?;
    let status = std::process::Command::new("xdot")
        .arg(file.path())
        .status()
        .context("running xdot")?;
    if !status.success() {
        bail!("xdot exited with {status}");
    }
    Ok(())
}

/// Writes to `path`, first preserving any existing file as a kept temp
/// copy rather than silently clobbering it.
fn write_with_backup(path: &Path, dot: &str) -> Result<()> {
    if path.exists() {
        let stem = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "prospect".to_string());
        let backup = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(".dot")
            .tempfile()
            .context("creating backup file")?;
        fs::copy(path, backup.path())
            .with_context(|| format!("backing up {}", path.display()))?;
        let (_, kept) = backup.keep().context("keeping backup file")?;
        tracing::info!("backed up existing {} to {}", path.display(), kept.display());
    }
    fs::write(path, dot).with_context(|| format!("writing {}", path.display()))
}
