use super::stage::{exit_code_for, report_failures, stage_error};
use super::{build_stager, json_pretty, load_plan, InstallArgs, TargetArgs};
use std::path::Path;

pub fn run(plan_path: &Path, target: &TargetArgs, install: &InstallArgs, json: bool) -> Result<u8, String> {
    let plan = load_plan(Some(plan_path))?;
    if plan.units.is_empty() {
        return Err(format!(
            "plan error: {} lists no [[unit]] entries",
            plan_path.display()
        ));
    }
    let fallback = plan_path.parent().unwrap_or_else(|| Path::new("."));
    let stager = build_stager(&plan, target, install, fallback)?;

    let reports = stager.stage_plan(&plan).map_err(|e| stage_error(&e))?;

    if json {
        println!("{}", json_pretty(&reports)?);
    } else {
        report_failures(&reports);
        let installed: usize = reports.iter().map(|r| r.installed_count()).sum();
        println!("staged {} unit(s), {installed} file(s) installed", reports.len());
    }
    Ok(exit_code_for(&reports))
}
