//! `wpilot prompt`: route natural language to a workflow or direct actions.

use anyhow::Result;
use console::style;

use webpilot_types::routing::{ParseStrategy, RouteOutcome, RoutedResult};

use super::workflow::{print_command_result, print_workflow_result};
use super::{print_json, spinner};
use crate::state::AppState;

pub async fn handle(state: &AppState, prompt: &str, json: bool) -> Result<()> {
    let spinner = spinner(format!("Processing: {prompt}"))?;
    let routed = state.service.handle_prompt(prompt).await;
    spinner.finish_and_clear();

    if json {
        return print_json(&routed);
    }

    print_routed(state, &routed);
    Ok(())
}

fn print_routed(state: &AppState, routed: &RoutedResult) {
    let parsed = &routed.parsed;
    let strategy = match parsed.strategy {
        ParseStrategy::Oracle => state.oracle_name.as_deref().unwrap_or("oracle"),
        ParseStrategy::Keyword => "keywords",
        ParseStrategy::KeywordFallback => "keywords (oracle unavailable)",
    };

    println!();
    println!(
        "  {}  intent {} on {}  {}",
        style("Parsed:").bold(),
        style(&parsed.intent).cyan(),
        style(parsed.site.as_deref().unwrap_or("any site")).cyan(),
        style(format!("via {strategy}")).dim()
    );
    if !parsed.variables.is_empty() {
        let vars: Vec<String> = parsed
            .variables
            .iter()
            .map(|(k, v)| format!("{k}={}", super::inline(v)))
            .collect();
        println!("  {}  {}", style("Variables:").bold(), vars.join(", "));
    }

    if let Some(attempted) = &routed.attempted {
        println!(
            "  {} Workflow '{}' failed: {}",
            style("!").yellow().bold(),
            style(&attempted.workflow).cyan(),
            attempted.error
        );
        if let Some(healing) = attempted.result.as_ref().and_then(|r| r.healing.as_ref()) {
            super::repair::print_healing(healing);
        }
    }

    match &routed.result {
        RouteOutcome::Workflow(result) => print_workflow_result(result),
        RouteOutcome::Agent(agent) => {
            println!(
                "  {}  direct actions on {} ({})",
                style("Fallback:").bold(),
                style(&state.actuator_name).cyan(),
                agent.message
            );
            println!();
            for action in &agent.actions {
                print!("  ");
                print_command_result(&action.action, &action.outcome);
            }
            if !agent.all_succeeded() {
                println!(
                    "  {} Some direct actions failed; see the errors above.",
                    style("!").yellow().bold()
                );
            }
            println!();
        }
    }
}
