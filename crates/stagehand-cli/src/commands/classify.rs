use super::{colorize_kind, json_pretty, load_plan, resolve_target, TargetArgs, EXIT_SUCCESS};
use stagehand_core::Classifier;
use std::path::{Path, PathBuf};

pub fn run(files: &[PathBuf], target: &TargetArgs, plan: Option<&Path>, json: bool) -> Result<u8, String> {
    let plan = load_plan(plan)?;
    let descriptor = resolve_target(&plan, target)?;
    let classifier = Classifier::new(descriptor.os.family(), &plan.classify);

    let rows: Vec<serde_json::Value> = files
        .iter()
        .map(|f| {
            let relative = f.file_name().map_or(f.as_path(), Path::new);
            let c = classifier.classify_path(f, relative);
            serde_json::json!({
                "path": f,
                "kind": c.kind.as_str(),
                "excluded": c.excluded,
            })
        })
        .collect();

    if json {
        println!("{}", json_pretty(&rows)?);
    } else {
        for (file, row) in files.iter().zip(&rows) {
            let kind = row["kind"].as_str().unwrap_or("skip");
            println!("{:<16} {}", colorize_kind(kind), file.display());
        }
    }
    Ok(EXIT_SUCCESS)
}
