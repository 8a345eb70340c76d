//! Named pipeline registry
//!
//! The invocation surface: tools look pipelines up by name and either build
//! them from explicit options or take the default-configured variant, which
//! reads every option group from the process environment and installs no
//! hooks.

use super::builder::build_stage_list;
use super::converters::ConverterRegistry;
use super::error::PipelineResult;
use super::hooks::PipelineHooks;
use super::stage::{StageKind, StageList};
use crate::config::{ConfigError, ConfigResult, PipelineOptions, ResolvedOptions};
use std::collections::BTreeMap;
use std::fmt;

pub const TRANSFORMATION_PIPELINE: &str = "tensorvm-transformation-pipeline";
pub const VERIFY_LEGALITY_PIPELINE: &str = "tensorvm-verify-transform-legality";

type BuildFn = fn(&ResolvedOptions, &PipelineHooks) -> StageList;

/// A registered pipeline
#[derive(Clone)]
pub struct PipelineRegistration {
    pub name: &'static str,
    pub description: &'static str,
    build: BuildFn,
}

impl fmt::Debug for PipelineRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineRegistration")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl PipelineRegistration {
    pub fn new(name: &'static str, description: &'static str, build: BuildFn) -> Self {
        Self {
            name,
            description,
            build,
        }
    }

    /// Build from already-resolved options
    pub fn build(&self, options: &ResolvedOptions, hooks: &PipelineHooks) -> StageList {
        (self.build)(options, hooks)
    }

    /// Resolve `options` against `hooks` and the builtin converters, then build
    pub fn build_with(
        &self,
        options: PipelineOptions,
        hooks: &PipelineHooks,
    ) -> PipelineResult<StageList> {
        let resolved = options.resolve(hooks, &ConverterRegistry::builtin())?;
        Ok(self.build(&resolved, hooks))
    }

    /// Default-configured variant: options from the environment, no hooks
    pub fn build_default(&self) -> PipelineResult<StageList> {
        let hooks = PipelineHooks::empty();
        self.build_with(PipelineOptions::from_env()?, &hooks)
    }
}

/// Gate-only pipeline using the configured rule
pub fn build_verify_legality_list(options: &ResolvedOptions, _hooks: &PipelineHooks) -> StageList {
    let target_backend = options.target_backend();
    let mut stages = StageList::new();
    stages.push(StageKind::VerifyTransformLegality {
        op_kind: target_backend.legality_op_kind.clone(),
        marker: target_backend.legality_marker.clone(),
    });
    stages
}

/// Name → pipeline map
#[derive(Debug, Clone, Default)]
pub struct PipelineRegistry {
    entries: BTreeMap<&'static str, PipelineRegistration>,
}

impl PipelineRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the pipelines this crate ships
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(PipelineRegistration::new(
            TRANSFORMATION_PIPELINE,
            "Runs the full input to VM transformation pipeline",
            build_stage_list,
        ));
        registry.register(PipelineRegistration::new(
            VERIFY_LEGALITY_PIPELINE,
            "Checks that no transform markers remain on the configured op kind",
            build_verify_legality_list,
        ));
        registry
    }

    /// Add or replace a registration
    pub fn register(&mut self, registration: PipelineRegistration) {
        if self
            .entries
            .insert(registration.name, registration)
            .is_some()
        {
            tracing::debug!("replaced an existing pipeline registration");
        }
    }

    pub fn get(&self, name: &str) -> ConfigResult<&PipelineRegistration> {
        self.entries.get(name).ok_or_else(|| {
            let registered = self.names().into_iter().map(String::from).collect();
            ConfigError::unknown_pipeline(name, registered)
        })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipelineRegistration> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionModel;
    use crate::pipeline::error::PipelineError;

    #[test]
    fn test_builtin_entries() {
        let registry = PipelineRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec![TRANSFORMATION_PIPELINE, VERIFY_LEGALITY_PIPELINE]
        );
        assert_eq!(
            registry.get(TRANSFORMATION_PIPELINE).unwrap().description,
            "Runs the full input to VM transformation pipeline"
        );
    }

    #[test]
    fn test_unknown_pipeline_suggests() {
        let err = PipelineRegistry::builtin()
            .get("tensorvm-transformaton-pipeline")
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Did you mean 'tensorvm-transformation-pipeline'?"));
    }

    #[test]
    fn test_build_with_explicit_options() {
        let registry = PipelineRegistry::builtin();
        let list = registry
            .get(TRANSFORMATION_PIPELINE)
            .unwrap()
            .build_with(
                PipelineOptions::new().scheduling(|s| s.execution_model(ExecutionModel::HostOnly)),
                &PipelineHooks::empty(),
            )
            .unwrap();
        assert!(!list.contains("scheduling-lowering"));
    }

    #[test]
    fn test_build_with_surfaces_config_errors() {
        let registry = PipelineRegistry::builtin();
        let err = registry
            .get(TRANSFORMATION_PIPELINE)
            .unwrap()
            .build_with(
                PipelineOptions::new()
                    .strict_mode(true)
                    .high_level_optimization(|h| h.const_eval(true)),
                &PipelineHooks::empty(),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_verify_pipeline_is_gate_only() {
        let list = PipelineRegistry::builtin()
            .get(VERIFY_LEGALITY_PIPELINE)
            .unwrap()
            .build_with(
                PipelineOptions::new().target_backend(|t| t.legality_rule("test.op", "test.marker")),
                &PipelineHooks::empty(),
            )
            .unwrap();
        assert_eq!(
            list.to_pipeline_string(),
            "verify-transform-legality{op-kind=test.op marker=test.marker}"
        );
    }
}
