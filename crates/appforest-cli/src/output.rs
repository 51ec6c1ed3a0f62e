//! Table and JSON rendering for CLI results.

use anyhow::Result;
use console::style;
use serde_json::json;

use appforest_core::error::SaveError;
use appforest_core::scheduler::{SavePlan, SaveReport};
use appforest_core::tree::{Forest, NodeId};
use appforest_core::validate::ValidationReport;

use crate::OutputFormat;

pub(crate) fn print_tree(forest: &Forest, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if forest.is_empty() {
                println!("No applications reported by the server.");
                return Ok(());
            }

            println!("  {:<40} {:<12} State", "Name", "Version");
            println!("  {}", "-".repeat(66));
            for id in forest.ids() {
                let node = forest.node(id);
                let indent = "  ".repeat(forest.depth(id));
                let label = format!("{}{}", indent, node.name());
                let state = if node.current_state() {
                    style(node.state()).green()
                } else {
                    style(node.state()).dim()
                };
                println!("  {:<40} {:<12} {}", label, node.version(), state);
            }
            println!();
            println!("Summary: {} applications", forest.len());
        }
        OutputFormat::Json => {
            let roots: Vec<_> = forest
                .roots()
                .iter()
                .map(|&root| node_json(forest, root))
                .collect();
            println!("{}", serde_json::to_string_pretty(&roots)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn node_json(forest: &Forest, id: NodeId) -> serde_json::Value {
    let node = forest.node(id);
    let children: Vec<_> = node
        .children()
        .iter()
        .map(|&child| node_json(forest, child))
        .collect();
    json!({
        "name": node.name(),
        "appId": node.app_id(),
        "version": node.version(),
        "state": node.state(),
        "running": node.current_state(),
        "children": children,
    })
}

pub(crate) fn print_plan(plan: &SavePlan, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if plan.is_empty() {
                println!("• Nothing to change");
                return Ok(());
            }

            for (index, step) in plan.steps().enumerate() {
                let indent = "  ".repeat(step.depth);
                println!(
                    "{:>3}. {:<10} {}{}",
                    index + 1,
                    step.action,
                    indent,
                    step.name
                );
            }
            println!();
            println!(
                "Summary: {} to uninstall, {} to install",
                plan.uninstall.len(),
                plan.install.len()
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(plan)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

pub(crate) fn progress_line(message: &str, percent: f64) -> String {
    format!("{} {}", style(format!("[{percent:>3.0}%]")).cyan(), message)
}

pub(crate) fn print_save_error(err: &SaveError, format: OutputFormat) {
    if format == OutputFormat::Json {
        return;
    }
    match err {
        SaveError::Remote(failures) => {
            for failure in failures {
                eprintln!("{} {}", style("✗").red(), failure);
            }
        }
        SaveError::Cancelled { completed } => {
            eprintln!(
                "{} Cancelled after {} completed operation(s)",
                style("⚠").yellow(),
                completed
            );
        }
    }
}

pub(crate) fn print_validation(
    report: &ValidationReport,
    saved: &Result<SaveReport, SaveError>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if report.is_success() {
                println!("{} {}", style("✓").green(), report.message);
            } else {
                println!("{} {}", style("✗").red(), report.message);
                for app_id in &report.failed {
                    println!("  ⚠ {} is not active", app_id);
                }
            }
        }
        OutputFormat::Json => {
            let output = validation_json(report, saved);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {
            for app_id in &report.failed {
                println!("✗ {}", app_id);
            }
        }
    }
    Ok(())
}

fn validation_json(
    report: &ValidationReport,
    saved: &Result<SaveReport, SaveError>,
) -> serde_json::Value {
    let (applied, cancelled, failures) = match saved {
        Ok(applied) => (Some(applied), false, Vec::new()),
        Err(err) => (
            None,
            matches!(err, SaveError::Cancelled { .. }),
            err.failures().iter().map(ToString::to_string).collect(),
        ),
    };
    json!({
        "validation": report,
        "applied": applied,
        "cancelled": cancelled,
        "failures": failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforest_core::error::{Action, RemoteFailure, RemoteOperationError};

    fn failed_report() -> ValidationReport {
        ValidationReport {
            failed: vec!["search".to_string()],
            total: 2,
            done_percent: 50.0,
            message: "An application failed to install.".to_string(),
        }
    }

    #[test]
    fn test_validation_json_lists_save_failures() {
        let saved = Err(SaveError::Remote(vec![RemoteOperationError::new(
            "search",
            Action::Install,
            RemoteFailure::Rejected {
                status: 500,
                message: "boom".to_string(),
            },
        )]));

        let output = validation_json(&failed_report(), &saved);
        assert!(output["applied"].is_null());
        assert_eq!(output["cancelled"], false);
        let failures = output["failures"].as_array().unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].as_str().unwrap().contains("'search'"));
        assert_eq!(output["validation"]["failed"][0], "search");
    }

    #[test]
    fn test_validation_json_after_successful_save() {
        let saved = Ok(SaveReport {
            uninstalled: vec![],
            installed: vec!["catalog".to_string()],
        });

        let output = validation_json(&failed_report(), &saved);
        assert_eq!(output["applied"]["installed"][0], "catalog");
        assert!(output["failures"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_validation_json_marks_cancellation() {
        let saved = Err(SaveError::Cancelled { completed: 1 });

        let output = validation_json(&failed_report(), &saved);
        assert_eq!(output["cancelled"], true);
    }
}
