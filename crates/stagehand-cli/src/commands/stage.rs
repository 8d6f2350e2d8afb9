use super::{build_stager, json_pretty, load_plan, InstallArgs, TargetArgs, EXIT_PARTIAL, EXIT_SUCCESS};
use stagehand_core::{StageError, StageReport, UnitPaths};
use std::path::Path;
use tracing::warn;

pub fn stage_error(e: &StageError) -> String {
    match e {
        StageError::Target(inner) => format!("target error: {inner}"),
        other => other.to_string(),
    }
}

pub fn exit_code_for(reports: &[StageReport]) -> u8 {
    if reports.iter().all(StageReport::is_complete) {
        EXIT_SUCCESS
    } else {
        EXIT_PARTIAL
    }
}

pub fn report_failures(reports: &[StageReport]) {
    for report in reports {
        if !report.is_complete() {
            warn!(
                "{}: {} file(s) failed to stage",
                report.unit,
                report.failures.len()
            );
        }
    }
}

pub fn run(
    source_dir: &Path,
    output_dir: &Path,
    name: Option<&str>,
    target: &TargetArgs,
    install: &InstallArgs,
    json: bool,
) -> Result<u8, String> {
    let plan = load_plan(install.plan.as_deref())?;
    let stager = build_stager(&plan, target, install, output_dir)?;

    let mut unit = UnitPaths::new(source_dir, output_dir);
    if let Some(n) = name {
        unit = unit.with_name(n);
    }
    let report = stager.stage_unit(&unit).map_err(|e| stage_error(&e))?;
    let reports = [report];

    if json {
        println!("{}", json_pretty(&reports[0])?);
    } else {
        report_failures(&reports);
    }
    Ok(exit_code_for(&reports))
}
