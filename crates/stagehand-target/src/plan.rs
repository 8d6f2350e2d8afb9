use crate::{OperatingSystem, ResolverInput, TargetError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File whose presence marks the top of the build tree.
pub const DEFAULT_MARKER: &str = "CMakeCache.txt";
/// Upper bound on directories climbed when looking for [`DEFAULT_MARKER`].
pub const DEFAULT_MAX_ASCENT: usize = 8;

/// Optional TOML staging plan (`stagehand.toml`).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StagingPlan {
    #[serde(default = "default_plan_version")]
    pub plan_version: u32,
    #[serde(default)]
    pub target: TargetSection,
    #[serde(default)]
    pub install: InstallSection,
    #[serde(default)]
    pub pools: PoolsSection,
    #[serde(default)]
    pub classify: ClassifySection,
    #[serde(default, rename = "unit")]
    pub units: Vec<UnitEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub configuration: Option<String>,
    #[serde(default)]
    pub multi_config: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InstallSection {
    #[serde(default)]
    pub build_dir: Option<PathBuf>,
    #[serde(default)]
    pub prefix: Option<PathBuf>,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_max_ascent")]
    pub max_ascent: usize,
}

impl Default for InstallSection {
    fn default() -> Self {
        Self {
            build_dir: None,
            prefix: None,
            marker: default_marker(),
            max_ascent: default_max_ascent(),
        }
    }
}

/// Relative locations, anchored at a unit's source directory.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PoolsSection {
    /// Shared cross-unit data pool; the first existing entry is used.
    #[serde(default = "default_shared_data")]
    pub shared_data: Vec<PathBuf>,
    /// Windows shared-library pool; the first entry yielding a `.dll` is used.
    #[serde(default = "default_platform_libs")]
    pub platform_libs: Vec<PathBuf>,
}

impl Default for PoolsSection {
    fn default() -> Self {
        Self {
            shared_data: default_shared_data(),
            platform_libs: default_platform_libs(),
        }
    }
}

/// Extension lists are compared case-insensitively and without leading dots.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClassifySection {
    #[serde(default)]
    pub extra_data_extensions: Vec<String>,
    #[serde(default)]
    pub extra_excluded_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UnitEntry {
    #[serde(default)]
    pub name: Option<String>,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

fn default_plan_version() -> u32 {
    1
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_owned()
}

fn default_max_ascent() -> usize {
    DEFAULT_MAX_ASCENT
}

fn default_shared_data() -> Vec<PathBuf> {
    vec![
        PathBuf::from("../../../Common/data"),
        PathBuf::from("../../../../Common/data"),
    ]
}

fn default_platform_libs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("../../../bin/win64"),
        PathBuf::from("../../../../bin/win64"),
        PathBuf::from("../../bin/win64"),
    ]
}

impl TargetSection {
    /// Layer this section over `input`; unset fields keep their value.
    pub fn apply_to(&self, input: &mut ResolverInput) -> Result<(), TargetError> {
        if let Some(arch) = &self.architecture {
            input.architecture = Some(arch.clone());
        }
        if let Some(os) = &self.os {
            input.os = Some(os.parse::<OperatingSystem>()?);
        }
        if let Some(cfg) = &self.configuration {
            input.configuration = Some(cfg.clone());
        }
        if self.multi_config {
            input.multi_config = true;
        }
        Ok(())
    }
}

impl StagingPlan {
    fn validate(&self) -> Result<(), TargetError> {
        if self.plan_version != 1 {
            return Err(TargetError::UnsupportedVersion(self.plan_version));
        }
        for (i, unit) in self.units.iter().enumerate() {
            if unit.source_dir.as_os_str().is_empty() || unit.output_dir.as_os_str().is_empty() {
                return Err(TargetError::EmptyUnitPath(i));
            }
        }
        Ok(())
    }

    /// Anchor every relative path in the plan at `base`. Pool entries stay
    /// relative; they are resolved against each unit's source directory.
    #[must_use]
    pub fn anchored_at(mut self, base: &Path) -> Self {
        let anchor = |p: &PathBuf| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.clone()
            }
        };
        self.install.build_dir = self.install.build_dir.as_ref().map(anchor);
        for unit in &mut self.units {
            unit.source_dir = anchor(&unit.source_dir);
            unit.output_dir = anchor(&unit.output_dir);
        }
        self
    }
}

pub fn parse_plan_str(input: &str) -> Result<StagingPlan, TargetError> {
    let plan: StagingPlan = toml::from_str(input)?;
    plan.validate()?;
    Ok(plan)
}

/// Parse a plan file, anchoring its relative paths at the file's directory.
pub fn parse_plan_file(path: impl AsRef<Path>) -> Result<StagingPlan, TargetError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let plan = parse_plan_str(&content)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(plan.anchored_at(base))
}
