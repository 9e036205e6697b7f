//! `repomirror once` — a single sync cycle, or a read-only preview of one.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use repomirror_daemon::{build_orchestrator, init_tracing};
use repomirror_engine::{CyclePlan, CycleReport, TargetPlan};

/// Arguments for `repomirror once`.
#[derive(Args, Debug)]
pub struct OnceArgs {
    /// List what would change without creating or deleting anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl OnceArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config()?;
        init_tracing(&config.log).context("failed to set up logging")?;
        let orchestrator =
            build_orchestrator(&config).context("failed to set up instance clients")?;

        if self.dry_run {
            let plan = orchestrator
                .plan_cycle()
                .context("could not list the source instance")?;
            if self.json {
                print_json(&plan)?;
            } else {
                print_plan(&plan);
            }
            return Ok(());
        }

        let report = orchestrator.run_cycle();
        if self.json {
            print_json(&report)?;
        } else {
            print_report(&report);
        }
        if let Some(err) = &report.source_error {
            bail!("sync cycle aborted: {err}");
        }
        Ok(())
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize JSON output")?
    );
    Ok(())
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "action")]
    action: &'static str,
    #[tabled(rename = "workspace")]
    workspace: String,
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn plan_rows(plan: &TargetPlan) -> Vec<PlanRow> {
    let mut rows = Vec::new();
    for workspace in &plan.workspaces.to_create {
        rows.push(PlanRow {
            action: "create workspace",
            workspace: workspace.name.clone(),
            repository: String::new(),
            detail: String::new(),
        });
    }
    for workspace in &plan.workspaces.to_delete {
        rows.push(PlanRow {
            action: "delete workspace",
            workspace: workspace.name.clone(),
            repository: String::new(),
            detail: "drain repositories first".to_string(),
        });
    }
    for changes in &plan.repositories {
        for repo in &changes.create {
            rows.push(PlanRow {
                action: "create repository",
                workspace: changes.workspace.clone(),
                repository: repo.name.clone(),
                detail: repo.remote_url.clone(),
            });
        }
        for repo in &changes.delete {
            rows.push(PlanRow {
                action: "delete repository",
                workspace: changes.workspace.clone(),
                repository: repo.name.clone(),
                detail: format!("id {}", repo.id),
            });
        }
    }
    rows
}

fn print_plan(plan: &CyclePlan) {
    println!("[dry-run] nothing will be changed");
    for target in &plan.targets {
        println!("{}", format!("target {}", target.instance).bold());
        if let Some(err) = &target.error {
            println!("  {} {err}", "error:".red().bold());
            continue;
        }
        if target.is_noop() {
            println!("  {}", "in sync".green());
            continue;
        }
        let mut table = Table::new(plan_rows(target));
        table.with(Style::rounded());
        println!("{table}");
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "target")]
    target: String,
    #[tabled(rename = "status")]
    status: &'static str,
    #[tabled(rename = "workspaces +/-")]
    workspaces: String,
    #[tabled(rename = "abandoned")]
    abandoned: usize,
    #[tabled(rename = "repositories +/-")]
    repositories: String,
    #[tabled(rename = "failed workspaces")]
    failed_workspaces: usize,
}

fn print_report(report: &CycleReport) {
    if let Some(err) = &report.source_error {
        println!("{} {err}", "source unavailable:".red().bold());
        return;
    }

    let failed = report.failed_targets();
    let summary = format!(
        "sync cycle finished in {}ms: {} targets, {} failed",
        report.duration_ms,
        report.targets.len(),
        failed
    );
    if failed == 0 {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }

    let rows: Vec<ReportRow> = report
        .targets
        .iter()
        .map(|target| ReportRow {
            target: target.instance.clone(),
            status: if target.is_success() { "ok" } else { "failed" },
            workspaces: format!(
                "+{} / -{}",
                target.workspaces_created.len(),
                target.workspaces_deleted.len()
            ),
            abandoned: target.workspaces_abandoned.len(),
            repositories: format!(
                "+{} / -{}",
                target.repositories_created, target.repositories_deleted
            ),
            failed_workspaces: target.workspace_failures.len(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for target in &report.targets {
        if let Some(err) = &target.error {
            println!("{} {}: {err}", "error".red().bold(), target.instance);
        }
        for failure in &target.workspace_failures {
            println!(
                "{} {}/{}: {}",
                "error".red().bold(),
                target.instance,
                failure.workspace,
                failure.error
            );
        }
    }
}
