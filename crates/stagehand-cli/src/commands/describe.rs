use super::stage::stage_error;
use super::{build_stager, json_pretty, live_configuration, load_plan, InstallArgs, TargetArgs, EXIT_SUCCESS};
use std::path::Path;

pub fn run(target: &TargetArgs, install: &InstallArgs, json: bool) -> Result<u8, String> {
    let plan = load_plan(install.plan.as_deref())?;
    let stager = build_stager(&plan, target, install, Path::new("."))?;
    let descriptor = stager.target();
    let configuration = descriptor
        .configuration_for(live_configuration(install).as_deref())
        .map_err(|e| format!("target error: {e}"))?;
    let destination = stager.destination_dir().map_err(|e| stage_error(&e))?;

    if json {
        let info = serde_json::json!({
            "architecture": descriptor.architecture,
            "os": descriptor.os.as_str(),
            "configuration": configuration,
            "deferred": descriptor.configuration.is_deferred(),
            "install_root": stager.install_root(),
            "prefix": stager.prefix(),
            "destination": destination,
        });
        println!("{}", json_pretty(&info)?);
    } else {
        println!("architecture:  {}", descriptor.architecture);
        println!("os:            {}", descriptor.os);
        println!("configuration: {configuration}");
        println!("install root:  {}", stager.install_root().display());
        println!("destination:   {}", destination.display());
    }
    Ok(EXIT_SUCCESS)
}
