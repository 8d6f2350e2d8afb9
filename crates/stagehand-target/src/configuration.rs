use serde::{Deserialize, Serialize};

/// Configuration used when the caller leaves it unset.
pub const DEFAULT_CONFIGURATION: &str = "release";

/// The configuration component of a target triple.
///
/// Single-configuration generators know the configuration when the build is
/// configured, so it is frozen as `Fixed`. Multi-configuration generators only
/// learn it at install time; `Deferred` is evaluated against the live
/// configuration name then, and falls back to the configure-time value when
/// the generator does not supply one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationExpr {
    Fixed(String),
    Deferred { fallback: String },
}

impl ConfigurationExpr {
    /// Build the expression for a generator. `requested` is the configure-time
    /// configuration, if any.
    pub fn for_generator(multi_config: bool, requested: Option<&str>) -> Self {
        let frozen = requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CONFIGURATION)
            .to_lowercase();
        if multi_config {
            Self::Deferred { fallback: frozen }
        } else {
            Self::Fixed(frozen)
        }
    }

    /// Lower-cased configuration name for this install.
    pub fn evaluate(&self, live: Option<&str>) -> String {
        match self {
            Self::Fixed(name) => name.to_lowercase(),
            Self::Deferred { fallback } => live
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map_or_else(|| fallback.to_lowercase(), str::to_lowercase),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred { .. })
    }
}
