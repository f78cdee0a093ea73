//! Workflow subcommands: init, list, show, run, record, create, exec.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use comfy_table::Cell;
use console::style;
use dialoguer::Input;
use serde_json::{Value, json};

use webpilot_infra::config::write_default_config;
use webpilot_types::execution::{CommandResult, WorkflowResult};
use webpilot_types::workflow::{Step, StepArgs, Variables, WorkflowSpec};

use super::{inline, parse_step, print_json, spinner, table};
use crate::cli::repair::print_healing;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

pub async fn init(state: &AppState, json: bool) -> Result<()> {
    let wrote_config = write_default_config(&state.data_dir)
        .await
        .context("Failed to write default config")?;
    let names = state
        .service
        .store()
        .create_samples()
        .await
        .context("Failed to save sample workflows")?;

    if json {
        return print_json(&json!({
            "data_dir": state.data_dir.display().to_string(),
            "config_written": wrote_config,
            "workflows": names,
            "actuator": state.actuator_name,
            "oracle": state.oracle_name,
            "healing_enabled": state.config.healing.enabled,
        }));
    }

    println!();
    println!("  {} Initialized webpilot", style("✓").green().bold());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    if wrote_config {
        println!("  Wrote default config.toml");
    }
    println!(
        "  Actuator: {}  Oracle: {}  Self-healing: {}",
        style(&state.actuator_name).cyan(),
        style(state.oracle_name.as_deref().unwrap_or("none (keyword parsing)")).cyan(),
        if state.config.healing.enabled { "on" } else { "off" }
    );
    for name in &names {
        println!("  {} {}", style("•").dim(), style(name).cyan());
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// List / show
// ---------------------------------------------------------------------------

pub async fn list(state: &AppState, json: bool) -> Result<()> {
    let workflows = state.service.list_workflows().await;

    if json {
        return print_json(&workflows);
    }

    if workflows.is_empty() {
        println!();
        println!("  No workflows found in {}.", style(state.workflows_dir.display()).dim());
        println!("  Seed the samples with: {}", style("wpilot init").dim());
        println!();
        return Ok(());
    }

    let mut table = table(&["Name", "Version", "Domain", "Steps", "Description"]);
    for w in &workflows {
        table.add_row(vec![
            Cell::new(&w.name),
            Cell::new(&w.version),
            Cell::new(w.domain.as_deref().unwrap_or("N/A")),
            Cell::new(w.steps),
            Cell::new(&w.description),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub async fn show(state: &AppState, name: &str, json: bool) -> Result<()> {
    let Some(workflow) = state.service.get_workflow(name).await else {
        bail!("Workflow '{name}' not found");
    };

    if json {
        return print_json(&workflow);
    }

    println!();
    println!(
        "  {} {}",
        style(&workflow.name).cyan().bold(),
        style(format!("v{}", workflow.version)).dim()
    );
    if let Some(domain) = &workflow.domain {
        println!("  {}  {domain}", style("Domain:").bold());
    }
    if !workflow.description().is_empty() {
        println!("  {}  {}", style("Description:").bold(), workflow.description());
    }
    if !workflow.variables.is_empty() {
        let vars: Vec<String> = workflow
            .variables
            .iter()
            .map(|(k, t)| format!("{k}: {t}"))
            .collect();
        println!("  {}  {}", style("Variables:").bold(), vars.join(", "));
    }
    println!();

    if workflow.steps.is_empty() {
        println!("  No steps recorded yet.");
        println!();
        return Ok(());
    }

    let mut table = table(&["#", "Action", "Arguments", "Retry", "Timeout"]);
    for (i, step) in workflow.steps.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i),
            Cell::new(&step.action),
            Cell::new(format_args(&step.args)),
            Cell::new(
                step.retry_count
                    .map(|n| format!("{n} x {}s", step.retry_delay.unwrap_or(0)))
                    .unwrap_or_default(),
            ),
            Cell::new(step.timeout.map(|t| format!("{t}s")).unwrap_or_default()),
        ]);
    }
    println!("{table}");
    println!();
    Ok(())
}

fn format_args(args: &StepArgs) -> String {
    args.iter()
        .map(|(k, v)| format!("{k}={}", inline(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

pub async fn run(
    state: &AppState,
    name: &str,
    vars: Vec<(String, Value)>,
    json: bool,
) -> Result<()> {
    let variables: Variables = vars.into_iter().collect();

    let spinner = spinner(format!("Running {name}..."))?;
    let result = state.service.run_workflow(name, &variables).await;
    spinner.finish_and_clear();
    let result = result?;

    if json {
        return print_json(&result);
    }

    print_workflow_result(&result);
    Ok(())
}

pub(crate) fn print_workflow_result(result: &WorkflowResult) {
    println!();
    if result.success {
        println!(
            "  {} Workflow '{}' completed ({} steps)",
            style("✓").green().bold(),
            style(&result.workflow).cyan(),
            result.executed_steps
        );
    } else {
        println!(
            "  {} Workflow '{}' failed at step {}",
            style("✗").red().bold(),
            style(&result.workflow).cyan(),
            result.failed_step.map(|i| i.to_string()).unwrap_or_default()
        );
    }
    println!();

    let mut table = table(&["#", "Action", "Status", "Attempts", "Result"]);
    for outcome in &result.results {
        let (status, detail) = if outcome.success {
            (
                Cell::new("ok").fg(comfy_table::Color::Green),
                outcome.data.as_ref().map(inline).unwrap_or_default(),
            )
        } else {
            (
                Cell::new("failed").fg(comfy_table::Color::Red),
                outcome.error.clone().unwrap_or_default(),
            )
        };
        table.add_row(vec![
            Cell::new(outcome.index),
            Cell::new(&outcome.action),
            status,
            Cell::new(outcome.attempts),
            Cell::new(detail),
        ]);
    }
    println!("{table}");

    if let Some(healing) = &result.healing {
        print_healing(healing);
    }
    println!();
}

// ---------------------------------------------------------------------------
// Record / create
// ---------------------------------------------------------------------------

pub async fn record(state: &AppState, name: &str, json: bool) -> Result<()> {
    let workflow = state
        .service
        .record_workflow(name)
        .await
        .with_context(|| format!("Failed to record workflow '{name}'"))?;

    if json {
        return print_json(&workflow);
    }

    println!();
    println!(
        "  {} Recorded empty workflow '{}'",
        style("✓").green().bold(),
        style(&workflow.name).cyan()
    );
    println!(
        "  Add steps by editing {}",
        style(state.workflows_dir.join(format!("{name}.yaml")).display()).dim()
    );
    println!();
    Ok(())
}

pub async fn create(
    state: &AppState,
    name: &str,
    steps: Vec<Step>,
    domain: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let steps = if steps.is_empty() && !json {
        prompt_steps()?
    } else {
        steps
    };
    if steps.is_empty() {
        bail!("No steps added, workflow '{name}' not created");
    }

    let description = description.unwrap_or_else(|| format!("Custom workflow: {name}"));
    let mut workflow = WorkflowSpec::new(name)
        .with_metadata("description", Value::String(description))
        .with_metadata("created", Value::String(Utc::now().to_rfc3339()));
    workflow.domain = domain;
    workflow.steps = steps;

    state
        .service
        .save_workflow(&workflow)
        .await
        .with_context(|| format!("Failed to create workflow '{name}'"))?;

    if json {
        return print_json(&workflow);
    }

    println!();
    println!(
        "  {} Workflow '{}' created ({} steps)",
        style("✓").green().bold(),
        style(&workflow.name).cyan(),
        workflow.steps.len()
    );
    println!();
    Ok(())
}

/// Interactive step entry; an empty line finishes.
fn prompt_steps() -> Result<Vec<Step>> {
    println!("  Add workflow steps as action:key=value,... (empty line to finish)");
    let mut steps = Vec::new();
    loop {
        let line: String = Input::new()
            .with_prompt(format!("Step {}", steps.len()))
            .allow_empty(true)
            .interact_text()?;
        if line.trim().is_empty() {
            break;
        }
        match parse_step(line.trim()) {
            Ok(step) => steps.push(step),
            Err(e) => println!("  {} {e}", style("!").yellow()),
        }
    }
    Ok(steps)
}

// ---------------------------------------------------------------------------
// Exec
// ---------------------------------------------------------------------------

pub async fn exec(
    state: &AppState,
    action: &str,
    params: Vec<(String, Value)>,
    json: bool,
) -> Result<()> {
    let params: StepArgs = params.into_iter().collect();
    let result = state.service.execute_command(action, params).await;

    if json {
        return print_json(&result);
    }

    print_command_result(action, &result);
    if !result.success {
        bail!("Command '{action}' failed");
    }
    Ok(())
}

pub(crate) fn print_command_result(action: &str, result: &CommandResult) {
    if result.success {
        println!(
            "  {} {} {}",
            style("✓").green().bold(),
            style(action).cyan(),
            result.data.as_ref().map(inline).unwrap_or_default()
        );
    } else {
        println!(
            "  {} {} {}",
            style("✗").red().bold(),
            style(action).cyan(),
            result.error.as_deref().unwrap_or("failed")
        );
    }
}
