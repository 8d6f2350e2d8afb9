pub mod classify;
pub mod completions;
pub mod describe;
pub mod man_pages;
pub mod stage;
pub mod stage_plan;

use clap::Args;
use stagehand_core::{Stager, StagerOptions};
use stagehand_target::{
    parse_plan_file, OperatingSystem, ResolverInput, StagingPlan, TargetDescriptor,
};
use std::path::{Path, PathBuf};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_PLAN_ERROR: u8 = 2;
pub const EXIT_PARTIAL: u8 = 3;

/// Environment variable consulted for the live configuration name when
/// `--install-config` is not given.
pub const INSTALL_CONFIG_ENV: &str = "STAGEHAND_INSTALL_CONFIG";

/// Target overrides; each flag wins over the plan's `[target]` section.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Target architecture (defaults to the host architecture).
    #[arg(long = "arch")]
    pub arch: Option<String>,
    /// Target operating system: windows, darwin, linux, qnx, unknown.
    #[arg(long = "os")]
    pub os: Option<String>,
    /// Build configuration (blank means release).
    #[arg(long = "configuration")]
    pub configuration: Option<String>,
    /// Treat the generator as multi-configuration.
    #[arg(long = "multi-config", default_value_t = false)]
    pub multi_config: bool,
}

/// Install-location overrides; each flag wins over the plan's `[install]`.
#[derive(Debug, Clone, Default, Args)]
pub struct InstallArgs {
    /// Plan file supplying defaults.
    #[arg(long = "plan")]
    pub plan: Option<PathBuf>,
    /// Build directory the install root is searched from.
    #[arg(long = "build-dir")]
    pub build_dir: Option<PathBuf>,
    /// Install prefix (defaults to `<install root>/bin`).
    #[arg(long = "prefix")]
    pub prefix: Option<PathBuf>,
    /// Marker file identifying the top of the build tree.
    #[arg(long = "marker")]
    pub marker: Option<String>,
    /// Configuration active at install time (multi-config generators).
    #[arg(long = "install-config")]
    pub install_config: Option<String>,
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn colorize_kind(kind: &str) -> String {
    use console::Style;
    match kind {
        "executable" => Style::new().green().bold().apply_to(kind).to_string(),
        "shared-library" => Style::new().cyan().apply_to(kind).to_string(),
        "data" => Style::new().yellow().apply_to(kind).to_string(),
        "skip" => Style::new().dim().apply_to(kind).to_string(),
        other => other.to_owned(),
    }
}

/// Load the plan at `path`, or the built-in defaults when none is given.
pub fn load_plan(path: Option<&Path>) -> Result<StagingPlan, String> {
    match path {
        Some(p) => parse_plan_file(p).map_err(|e| format!("failed to read plan {}: {e}", p.display())),
        None => Ok(StagingPlan::default()),
    }
}

/// Layer host defaults, the plan's `[target]` section and CLI flags.
pub fn resolve_target(plan: &StagingPlan, args: &TargetArgs) -> Result<TargetDescriptor, String> {
    let mut input = ResolverInput::host();
    plan.target
        .apply_to(&mut input)
        .map_err(|e| format!("plan error: {e}"))?;
    if let Some(arch) = &args.arch {
        input.architecture = Some(arch.clone());
    }
    if let Some(os) = &args.os {
        input.os = Some(
            os.parse::<OperatingSystem>()
                .map_err(|e| format!("target error: {e}"))?,
        );
    }
    if let Some(cfg) = &args.configuration {
        input.configuration = Some(cfg.clone());
    }
    if args.multi_config {
        input.multi_config = true;
    }
    TargetDescriptor::resolve(input).map_err(|e| format!("target error: {e}"))
}

fn absolutize(path: &Path) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| format!("failed to read current dir: {e}"))?;
    Ok(cwd.join(path))
}

/// Live configuration: `--install-config` first, then the environment.
pub fn live_configuration(args: &InstallArgs) -> Option<String> {
    args.install_config
        .clone()
        .or_else(|| std::env::var(INSTALL_CONFIG_ENV).ok())
        .filter(|s| !s.trim().is_empty())
}

/// Build the staging context. `fallback_build_dir` is used when neither the
/// flags nor the plan name a build directory.
pub fn build_stager(
    plan: &StagingPlan,
    target: &TargetArgs,
    install: &InstallArgs,
    fallback_build_dir: &Path,
) -> Result<Stager, String> {
    let descriptor = resolve_target(plan, target)?;
    let build_dir = match (&install.build_dir, &plan.install.build_dir) {
        (Some(dir), _) => absolutize(dir)?,
        (None, Some(dir)) => dir.clone(),
        (None, None) => absolutize(fallback_build_dir)?,
    };
    let marker = install
        .marker
        .clone()
        .unwrap_or_else(|| plan.install.marker.clone());
    let prefix = match &install.prefix {
        Some(p) => Some(absolutize(p)?),
        None => plan.install.prefix.clone(),
    };
    let options = StagerOptions {
        prefix,
        live_configuration: live_configuration(install),
        pools: plan.pools.clone(),
        classify: plan.classify.clone(),
    };
    Ok(Stager::for_build_dir(
        descriptor,
        &build_dir,
        &marker,
        plan.install.max_ascent,
        options,
    ))
}
