//! Repair review subcommands: repairs, approve, discard, failures.
//!
//! Suggestions are only ever applied from `approve`, after the confirmation
//! prompt (or `--yes`).

use anyhow::{Result, bail};
use comfy_table::Cell;
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use webpilot_types::healing::{HealingResult, RepairKind, RepairSuggestion};

use super::{inline, print_json, table};
use crate::state::AppState;

pub fn list(state: &AppState, workflow: Option<&str>, json: bool) -> Result<()> {
    let suggestions = state.service.get_repair_suggestions(workflow);

    if json {
        return print_json(&suggestions);
    }

    if suggestions.is_empty() {
        println!();
        println!("  No pending repair suggestions.");
        println!();
        return Ok(());
    }

    let mut table = table(&["ID", "Workflow", "Step", "Issue", "Confidence", "Suggested fix"]);
    for s in &suggestions {
        table.add_row(vec![
            Cell::new(short_id(s.id)),
            Cell::new(&s.workflow_name),
            Cell::new(s.step_index),
            Cell::new(s.issue_type),
            Cell::new(format!("{:.0}%", s.confidence_score * 100.0)),
            Cell::new(describe_fix(s)),
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  Apply one with {}",
        style("wpilot approve <id>").dim()
    );
    println!();
    Ok(())
}

pub async fn approve(state: &AppState, id: &str, yes: bool, json: bool) -> Result<()> {
    let suggestion = resolve(state, id)?;

    if !yes {
        print_suggestion(&suggestion);
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Apply this repair to workflow '{}'?",
                style(&suggestion.workflow_name).cyan()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Repair not applied.");
            return Ok(());
        }
    }

    let workflow = state.service.apply_repair(suggestion.id, true).await?;

    if json {
        return print_json(&workflow);
    }

    println!();
    println!(
        "  {} Repair applied to '{}' (step {})",
        style("✓").green().bold(),
        style(&workflow.name).cyan(),
        suggestion.step_index
    );
    println!();
    Ok(())
}

pub async fn discard(state: &AppState, id: &str, json: bool) -> Result<()> {
    let suggestion = resolve(state, id)?;
    let discarded = state.service.discard_repair(suggestion.id).await?;

    if json {
        return print_json(&discarded);
    }

    println!();
    println!(
        "  {} Discarded suggestion {} for '{}'",
        style("✓").green().bold(),
        short_id(discarded.id),
        style(&discarded.workflow_name).cyan()
    );
    println!();
    Ok(())
}

pub fn failures(state: &AppState, workflow: Option<&str>, json: bool) -> Result<()> {
    let failures = state.service.get_failure_history(workflow);

    if json {
        return print_json(&failures);
    }

    if failures.is_empty() {
        println!();
        println!("  No failures recorded.");
        println!();
        return Ok(());
    }

    let mut table = table(&["Time", "Workflow", "Step", "Type", "Error"]);
    for f in &failures {
        table.add_row(vec![
            Cell::new(f.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&f.workflow_name),
            Cell::new(f.step_index),
            Cell::new(&f.error_type),
            Cell::new(&f.error_message),
        ]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Print the self-healing outcome attached to a failed run.
pub(crate) fn print_healing(healing: &HealingResult) {
    println!();
    match &healing.suggestion {
        Some(s) => {
            println!(
                "  {} Repair suggested ({}, {:.0}% confidence): {}",
                style("⚕").yellow().bold(),
                s.issue_type,
                s.confidence_score * 100.0,
                s.issue_description
            );
            println!("    {}", describe_fix(s));
            println!(
                "    Review with {} or apply with {}",
                style("wpilot repairs").dim(),
                style(format!("wpilot approve {}", short_id(s.id))).dim()
            );
        }
        None => println!("  {} {}", style("⚕").dim(), healing.message),
    }
}

fn print_suggestion(s: &RepairSuggestion) {
    println!();
    println!(
        "  {}  {} step {}",
        style("Workflow:").bold(),
        style(&s.workflow_name).cyan(),
        s.step_index
    );
    println!("  {}  {} ({:.0}%)", style("Issue:").bold(), s.issue_type, s.confidence_score * 100.0);
    println!("  {}  {}", style("Details:").bold(), s.issue_description);
    println!("  {}  {}", style("Fix:").bold(), describe_fix(s));
    println!();
}

fn describe_fix(s: &RepairSuggestion) -> String {
    let fix = &s.suggested_fix;
    let args = fix
        .args
        .iter()
        .map(|(k, v)| format!("{k}={}", inline(v)))
        .collect::<Vec<_>>()
        .join(", ");
    let mut extras = Vec::new();
    if let Some(n) = fix.retry_count {
        extras.push(format!("retry {n}x"));
    }
    if let Some(t) = fix.timeout {
        extras.push(format!("timeout {t}s"));
    }
    if fix.wait_for_load == Some(true) {
        extras.push("wait for load".to_string());
    }
    let extras = if extras.is_empty() {
        String::new()
    } else {
        format!(" [{}]", extras.join(", "))
    };
    let verb = match s.kind {
        RepairKind::Replace => "replace with",
        RepairKind::InsertBefore => "insert before",
    };
    format!("{verb} {}({args}){extras}", fix.action)
}

fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..16].to_string()
}

/// Find a pending suggestion by full id or unique prefix (dashes ignored).
fn resolve(state: &AppState, id: &str) -> Result<RepairSuggestion> {
    let needle = id.trim().replace('-', "").to_lowercase();
    if needle.is_empty() {
        bail!("Suggestion id must not be empty");
    }

    let mut matches: Vec<RepairSuggestion> = state
        .service
        .get_repair_suggestions(None)
        .into_iter()
        .filter(|s| s.id.simple().to_string().starts_with(&needle))
        .collect();

    match matches.len() {
        0 => bail!("No pending repair suggestion matches '{id}'"),
        1 => Ok(matches.remove(0)),
        n => bail!("'{id}' is ambiguous ({n} suggestions match); use more characters"),
    }
}
