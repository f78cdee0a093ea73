//! CLI command definitions for the `wpilot` binary.
//!
//! Uses clap derive macros for argument parsing. Handlers live in the
//! submodules; this module also holds the small parsers shared by them
//! (`key=value` pairs and `--step` specs) and the output helpers.

pub mod prompt;
pub mod repair;
pub mod workflow;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use webpilot_types::workflow::{Action, Step, StepArgs};

/// Run, route and self-heal browser automation workflows.
#[derive(Parser)]
#[command(name = "wpilot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Do not record failures or suggest repairs for this invocation.
    #[arg(long, global = true)]
    pub no_heal: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config and seed the sample workflows.
    Init,

    /// List available workflows.
    #[command(alias = "ls")]
    Workflows,

    /// Show a workflow definition.
    Show {
        /// Workflow name.
        name: String,
    },

    /// Run a workflow by name.
    Run {
        /// Workflow name.
        name: String,

        /// Runtime variable (repeatable), e.g. --var project_key=ABC.
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        vars: Vec<(String, Value)>,
    },

    /// Route a natural-language prompt to a workflow or direct actions.
    Prompt {
        /// The prompt text.
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Save an empty workflow to be filled in later.
    Record {
        /// Workflow name.
        name: String,
    },

    /// Create a workflow from step specs (interactive when none are given).
    Create {
        /// Workflow name.
        name: String,

        /// Step spec (repeatable): action:key=value,key=value
        #[arg(long = "step", value_name = "SPEC", value_parser = parse_step)]
        steps: Vec<Step>,

        /// Site or hostname used for prompt routing.
        #[arg(long)]
        domain: Option<String>,

        /// Human-readable description.
        #[arg(long)]
        description: Option<String>,
    },

    /// Execute a single action directly.
    Exec {
        /// Action name (navigate, click, type, extract, screenshot, authenticate).
        action: String,

        /// Action parameter (repeatable), e.g. --param url=https://example.com.
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        params: Vec<(String, Value)>,
    },

    /// List pending repair suggestions.
    Repairs {
        /// Only suggestions for this workflow.
        #[arg(long)]
        workflow: Option<String>,
    },

    /// Approve and apply a repair suggestion.
    Approve {
        /// Suggestion ID (a unique prefix is enough).
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Discard a repair suggestion.
    Discard {
        /// Suggestion ID (a unique prefix is enough).
        id: String,
    },

    /// Show recorded step failures.
    Failures {
        /// Only failures of this workflow.
        #[arg(long)]
        workflow: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

// ---------------------------------------------------------------------------
// Argument parsers
// ---------------------------------------------------------------------------

/// Values that parse as JSON scalars keep their type; everything else is a
/// string.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

/// Parse `key=value`. The value may itself contain `=`.
pub fn parse_key_value(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{raw}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{raw}'");
    }
    Ok((key.to_string(), parse_value(value)))
}

/// Parse `action:key=value,key=value`. The action must be a known one.
///
/// Pairs are split on commas that are followed by a `key=`; a comma inside a
/// value (e.g. a selector list) is kept.
pub fn parse_step(raw: &str) -> Result<Step> {
    let (action, rest) = raw.split_once(':').unwrap_or((raw, ""));
    let action: Action = action.trim().parse()?;

    let mut args = StepArgs::new();
    for pair in split_pairs(rest) {
        let (key, value) = parse_key_value(&pair)?;
        args.insert(key, value);
    }
    Ok(Step::new(action.as_str(), args))
}

fn split_pairs(rest: &str) -> Vec<String> {
    let mut pairs: Vec<String> = Vec::new();
    for piece in rest.split(',') {
        let starts_pair = piece
            .split_once('=')
            .is_some_and(|(key, _)| !key.trim().is_empty() && !key.contains([' ', '[', '\'']));
        match pairs.last_mut() {
            Some(last) if !starts_pair => {
                last.push(',');
                last.push_str(piece);
            }
            _ if piece.trim().is_empty() => {}
            _ => pairs.push(piece.to_string()),
        }
    }
    pairs
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

pub(crate) fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Ok(spinner)
}

pub(crate) fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let cell = Cell::new(h);
                    if i == 0 { cell.fg(Color::Cyan) } else { cell }
                })
                .collect::<Vec<_>>(),
        );
    table
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Compact one-line rendering of a JSON value for tables.
pub(crate) fn inline(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
