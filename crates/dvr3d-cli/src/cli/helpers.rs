use super::CliError;
use anyhow::Context;
use dvr3d_core::config::positions::GENERAL;
use dvr3d_core::config::{LoadMode, ParameterSet, Schema};
use dvr3d_core::jobs::{BatchSubmitter, JobManagerKind, SystemRunner};
use dvr3d_core::pipeline::{SubmitReport, UnitStatus};
use std::path::Path;

/// Defaults, then presets in order, then the merge file, then overrides; the
/// project name always wins.
pub(super) fn startproject_parameters(
    schema: &'static Schema,
    project: &str,
    templates: &[String],
    merge: Option<&Path>,
    overrides: Option<&str>,
) -> Result<ParameterSet, CliError> {
    let mut params = ParameterSet::new(schema);
    for template in templates {
        params.apply_preset(template)?;
    }
    if let Some(merge) = merge {
        params.load(merge, LoadMode::IgnoreEmpty)?;
    }
    if let Some(overrides) = overrides {
        params.apply_overrides(overrides)?;
    }
    params.set_text(GENERAL, "project", project)?;
    Ok(params)
}

pub(super) fn batch_submitter(
    params: &ParameterSet,
    create_section: &str,
) -> Result<BatchSubmitter<SystemRunner>, CliError> {
    let manager = JobManagerKind::parse(params.require_str(create_section, "job_manager")?)?;
    Ok(BatchSubmitter::new(manager, SystemRunner))
}

pub(super) fn print_submit_report(report: &SubmitReport) {
    println!(
        "submitted {} units, skipped {}",
        report.submitted.len(),
        report.skipped.len()
    );
    for (unit, state) in &report.skipped {
        println!("  {}: {}", unit, state);
    }
}

pub(super) fn print_statuses(statuses: &[UnitStatus], json: bool) -> Result<(), CliError> {
    if json {
        let rendered = serde_json::to_string_pretty(statuses)
            .context("failed to render the status report as JSON")?;
        println!("{}", rendered);
        return Ok(());
    }
    for status in statuses {
        println!("{}", status.describe());
    }
    Ok(())
}
