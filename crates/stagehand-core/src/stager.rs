use crate::{
    collect_candidates, dedup, resolve_install_root, ArtifactKind, Candidate, Classifier,
    Deployer, StageError, StageReport, UnitPaths,
};
use stagehand_target::{ClassifySection, PoolsSection, StagingPlan, TargetDescriptor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace};

/// One-shot guard for the target summary, owned by the staging context.
#[derive(Debug, Default)]
pub struct AnnounceGuard {
    announced: AtomicBool,
}

impl AnnounceGuard {
    /// True exactly once.
    pub fn claim(&self) -> bool {
        !self.announced.swap(true, Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StagerOptions {
    /// Install prefix. Relative values are taken from the install root;
    /// `None` means `<install root>/bin`.
    pub prefix: Option<PathBuf>,
    /// Configuration name supplied by the generator at install time.
    pub live_configuration: Option<String>,
    pub pools: PoolsSection,
    pub classify: ClassifySection,
}

/// Staging context for one build: the target descriptor and install root are
/// fixed here and every unit staged through it shares them.
#[derive(Debug)]
pub struct Stager {
    target: TargetDescriptor,
    install_root: PathBuf,
    prefix: PathBuf,
    live_configuration: Option<String>,
    pools: PoolsSection,
    classifier: Classifier,
    announce: AnnounceGuard,
}

impl Stager {
    pub fn new(target: TargetDescriptor, install_root: impl Into<PathBuf>, options: StagerOptions) -> Self {
        let install_root = install_root.into();
        let prefix = match options.prefix {
            Some(p) if p.is_absolute() => p,
            Some(p) => install_root.join(p),
            None => install_root.join("bin"),
        };
        let classifier = Classifier::new(target.os.family(), &options.classify);
        Self {
            target,
            install_root,
            prefix,
            live_configuration: options.live_configuration,
            pools: options.pools,
            classifier,
            announce: AnnounceGuard::default(),
        }
    }

    /// Resolve the install root from `build_dir` by marker search.
    pub fn for_build_dir(
        target: TargetDescriptor,
        build_dir: &Path,
        marker: &str,
        max_ascent: usize,
        options: StagerOptions,
    ) -> Self {
        let root = resolve_install_root(build_dir, marker, max_ascent);
        Self::new(target, root, options)
    }

    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The flat destination directory for this install.
    pub fn destination_dir(&self) -> Result<PathBuf, StageError> {
        Ok(self
            .target
            .destination_dir(&self.prefix, self.live_configuration.as_deref())?)
    }

    fn announce(&self, destination: &Path) {
        if self.announce.claim() {
            info!("Staging target: {}", self.target.summary());
            info!("Destination: {}", destination.display());
        }
    }

    /// Run collection, deduplication, classification and deployment for one unit.
    pub fn stage_unit(&self, unit: &UnitPaths) -> Result<StageReport, StageError> {
        let destination = self.destination_dir()?;
        self.announce(&destination);

        let name = unit.display_name();
        let manifest = collect_candidates(unit, &self.pools, self.classifier.family())?;
        let collected = manifest.len();
        let manifest = dedup(manifest);
        debug!(
            "{name}: {} unique candidate(s) of {collected}",
            manifest.len()
        );

        let items: Vec<(Candidate, ArtifactKind)> = manifest
            .candidates
            .into_iter()
            .map(|c| {
                let classification = self.classifier.classify(&c);
                trace!(
                    "{} -> {} {:?}",
                    c.source.display(),
                    classification.kind.as_str(),
                    classification.excluded
                );
                (c, classification.kind)
            })
            .collect();

        Deployer::new(destination, self.classifier.family()).deploy(&name, &items)
    }

    /// Stage every unit in order. A unit whose output directory is missing
    /// stops the run; per-file failures are carried in each report.
    pub fn stage_units<'a>(
        &self,
        units: impl IntoIterator<Item = &'a UnitPaths>,
    ) -> Result<Vec<StageReport>, StageError> {
        units.into_iter().map(|u| self.stage_unit(u)).collect()
    }

    /// Stage every `[[unit]]` of `plan` through this context.
    pub fn stage_plan(&self, plan: &StagingPlan) -> Result<Vec<StageReport>, StageError> {
        let units: Vec<UnitPaths> = plan.units.iter().map(UnitPaths::from).collect();
        self.stage_units(&units)
    }
}
