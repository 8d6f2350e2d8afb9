use crate::{ConfigurationExpr, OperatingSystem, PlatformFlags, TargetError};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Inputs to [`TargetDescriptor::resolve`], as gathered from the toolchain and
/// the invoker.
#[derive(Debug, Clone)]
pub struct ResolverInput {
    /// Processor identifier. Detected from the host when `None`.
    pub architecture: Option<String>,
    pub platform: PlatformFlags,
    /// Explicit OS override; skips flag classification.
    pub os: Option<OperatingSystem>,
    /// Configure-time configuration, if the caller set one.
    pub configuration: Option<String>,
    /// Whether the generator selects the configuration at build time.
    pub multi_config: bool,
}

impl Default for ResolverInput {
    fn default() -> Self {
        Self::host()
    }
}

impl ResolverInput {
    pub fn host() -> Self {
        Self {
            architecture: None,
            platform: PlatformFlags::host(),
            os: None,
            configuration: None,
            multi_config: false,
        }
    }
}

/// The `(architecture, os, configuration)` key for every destination path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDescriptor {
    pub architecture: String,
    pub os: OperatingSystem,
    pub configuration: ConfigurationExpr,
}

impl TargetDescriptor {
    pub fn new(
        architecture: &str,
        os: OperatingSystem,
        configuration: ConfigurationExpr,
    ) -> Result<Self, TargetError> {
        let architecture = architecture.trim().to_lowercase();
        if architecture.is_empty() {
            return Err(TargetError::EmptyArchitecture);
        }
        validate_component("architecture", &architecture)?;
        if let ConfigurationExpr::Fixed(name) | ConfigurationExpr::Deferred { fallback: name } =
            &configuration
        {
            validate_component("configuration", name)?;
        }
        Ok(Self {
            architecture,
            os,
            configuration,
        })
    }

    pub fn resolve(input: ResolverInput) -> Result<Self, TargetError> {
        let architecture = input
            .architecture
            .unwrap_or_else(|| std::env::consts::ARCH.to_owned());
        let os = input
            .os
            .unwrap_or_else(|| OperatingSystem::classify(&input.platform));
        let configuration =
            ConfigurationExpr::for_generator(input.multi_config, input.configuration.as_deref());
        Self::new(&architecture, os, configuration)
    }

    /// The configuration name to use for this install, validated as a path
    /// component.
    pub fn configuration_for(&self, live: Option<&str>) -> Result<String, TargetError> {
        let name = self.configuration.evaluate(live);
        validate_component("configuration", &name)?;
        Ok(name)
    }

    /// `<prefix>/<architecture>/<os>/<configuration>`
    pub fn destination_dir(&self, prefix: &Path, live: Option<&str>) -> Result<PathBuf, TargetError> {
        let configuration = self.configuration_for(live)?;
        Ok(prefix
            .join(&self.architecture)
            .join(self.os.as_str())
            .join(configuration))
    }

    /// One-line human-readable summary of the resolved key.
    pub fn summary(&self) -> String {
        let configuration = match &self.configuration {
            ConfigurationExpr::Fixed(name) => name.clone(),
            ConfigurationExpr::Deferred { fallback } => {
                format!("<install-time, default {fallback}>")
            }
        };
        format!(
            "architecture={} os={} configuration={configuration}",
            self.architecture, self.os
        )
    }
}

/// Reject values that would not land as exactly one directory level.
pub fn validate_component(what: &'static str, value: &str) -> Result<(), TargetError> {
    let mut components = Path::new(value).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || value.contains('/') || value.contains('\\') {
        return Err(TargetError::InvalidComponent {
            what,
            value: value.to_owned(),
        });
    }
    Ok(())
}
