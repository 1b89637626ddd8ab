use super::context::MigrationContext;
use super::step::MigrationStep;
use crate::core::{ParcelError, ParcelResult, Version};
use std::fmt;
use tracing::info;

/// What a plan moves its package to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanTarget {
    Version(Version),
    /// `sha256:<hex>` of the package resources
    ContentHash(String),
}

impl PlanTarget {
    /// The state recorded once the plan has been applied
    pub fn state(&self) -> String {
        match self {
            PlanTarget::Version(v) => v.to_string(),
            PlanTarget::ContentHash(h) => h.clone(),
        }
    }

    /// Whether a package recorded at `recorded` still needs this plan
    ///
    /// Versions only ever move forward: a recorded state that is an equal or
    /// higher version is never downgraded. Content hashes are pending whenever
    /// they differ from what was recorded.
    pub fn is_pending(&self, recorded: Option<&str>) -> bool {
        let Some(recorded) = recorded else {
            return true;
        };
        match self {
            PlanTarget::Version(target) => match Version::parse(recorded) {
                Ok(current) => current < *target,
                Err(_) => true,
            },
            PlanTarget::ContentHash(hash) => recorded != hash,
        }
    }
}

impl fmt::Display for PlanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanTarget::Version(v) => write!(f, "version {}", v),
            PlanTarget::ContentHash(h) => write!(f, "content {}", h),
        }
    }
}

type StepFactory = Box<dyn Fn() -> Box<dyn MigrationStep> + Send + Sync>;

struct PlannedStep {
    name: String,
    factory: StepFactory,
}

/// An ordered, immutable list of steps that moves one package to a target
pub struct MigrationPlan {
    package_name: String,
    plan_name: String,
    target: PlanTarget,
    steps: Vec<PlannedStep>,
}

impl MigrationPlan {
    pub fn builder(package_name: impl Into<String>) -> PlanBuilder {
        PlanBuilder {
            package_name: package_name.into(),
            plan_name: None,
            target: None,
            steps: Vec::new(),
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn plan_name(&self) -> &str {
        &self.plan_name
    }

    pub fn target(&self) -> &PlanTarget {
        &self.target
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in declaration order, stopping at the first failure
    pub fn execute(&self, ctx: &mut MigrationContext<'_>) -> ParcelResult<usize> {
        for (index, planned) in self.steps.iter().enumerate() {
            info!(
                package = %self.package_name,
                step = %planned.name,
                "Running migration step {}/{}",
                index + 1,
                self.steps.len()
            );
            let mut step = (planned.factory)();
            step.migrate(ctx)?;
        }
        Ok(self.steps.len())
    }
}

impl fmt::Debug for MigrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationPlan")
            .field("package_name", &self.package_name)
            .field("plan_name", &self.plan_name)
            .field("target", &self.target)
            .field("steps", &self.step_names())
            .finish()
    }
}

pub struct PlanBuilder {
    package_name: String,
    plan_name: Option<String>,
    target: Option<PlanTarget>,
    steps: Vec<PlannedStep>,
}

impl PlanBuilder {
    pub fn target_version(mut self, version: Version) -> Self {
        self.target = Some(PlanTarget::Version(version));
        self
    }

    pub fn target_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.target = Some(PlanTarget::ContentHash(hash.into()));
        self
    }

    /// Name recorded in the migration history (defaults to the package name)
    pub fn plan_name(mut self, name: impl Into<String>) -> Self {
        self.plan_name = Some(name.into());
        self
    }

    /// Append a step; `factory` is called once per execution
    pub fn step<F, S>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: MigrationStep + 'static,
    {
        self.steps.push(PlannedStep {
            name: name.into(),
            factory: Box::new(move || Box::new(factory()) as Box<dyn MigrationStep>),
        });
        self
    }

    pub fn build(self) -> ParcelResult<MigrationPlan> {
        if self.package_name.trim().is_empty() {
            return Err(ParcelError::Config(
                "Migration plan needs a package name".to_string(),
            ));
        }
        let target = self.target.ok_or_else(|| {
            ParcelError::Config(format!(
                "Migration plan for '{}' has no target version or content hash",
                self.package_name
            ))
        })?;
        if self.steps.is_empty() {
            return Err(ParcelError::Config(format!(
                "Migration plan for '{}' has no steps",
                self.package_name
            )));
        }

        Ok(MigrationPlan {
            plan_name: self.plan_name.unwrap_or_else(|| self.package_name.clone()),
            package_name: self.package_name,
            target,
            steps: self.steps,
        })
    }
}
