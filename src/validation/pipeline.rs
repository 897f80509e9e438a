//! Validation pipeline implementation.

use crate::config::ValidatorConfig;
use crate::container::Group;
use crate::core::context::StateSummary;
use crate::core::error::{StateResult, ValidationReport, ValidationResult};
use crate::core::version::SchemaVersion;
use crate::validation::stages::{
    stage_by_name, CombineEmbeddingsStage, CustomSelectionsStage, InputsStage, PcaStage,
    QualityControlStage, ValidationStage,
};
use log::debug;
use std::time::Instant;

/// Multi-stage validation pipeline.
///
/// Runs a series of stages over a state file. The first failing stage
/// aborts the run.
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
}

impl ValidationPipeline {
    /// Create a new pipeline with the given stages.
    pub fn new(stages: Vec<Box<dyn ValidationStage>>) -> Self {
        Self { stages }
    }

    /// Create the default pipeline with every stage.
    pub fn default_pipeline(embedded: bool) -> Self {
        Self {
            stages: vec![
                Box::new(InputsStage { embedded }),
                Box::new(QualityControlStage),
                Box::new(PcaStage),
                Box::new(CombineEmbeddingsStage),
                Box::new(CustomSelectionsStage),
            ],
        }
    }

    /// Build the pipeline named by a config.
    pub fn from_config(config: &ValidatorConfig) -> StateResult<Self> {
        let stages = config
            .stages
            .iter()
            .map(|name| stage_by_name(name, config.embedded))
            .collect::<StateResult<Vec<_>>>()?;
        Ok(Self::new(stages))
    }

    /// Add a custom validation stage.
    pub fn add_stage(&mut self, stage: Box<dyn ValidationStage>) {
        self.stages.push(stage);
    }

    /// Names of the stages, in run order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Validate a state through all stages and report the outcome.
    pub fn validate(&self, root: &Group, version: SchemaVersion) -> ValidationReport {
        let start = Instant::now();
        let mut summary = StateSummary::new(version);
        let mut passed = Vec::new();
        let mut failure = None;

        for stage in &self.stages {
            match stage.validate(root, &mut summary) {
                Ok(()) => {
                    debug!("stage '{}' passed", stage.name());
                    passed.push(stage.name().to_string());
                }
                Err(err) => {
                    debug!("stage '{}' failed", stage.name());
                    failure = Some((stage.name().to_string(), err));
                    break;
                }
            }
        }

        let mut report = ValidationReport::new(summary);
        for stage in passed {
            report.add_passed(stage);
        }
        if let Some((stage, err)) = failure {
            report.set_failure(stage, err);
        }
        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    /// Validate a state, returning the summary or the first failure.
    pub fn run(&self, root: &Group, version: SchemaVersion) -> ValidationResult<StateSummary> {
        let mut summary = StateSummary::new(version);
        for stage in &self.stages {
            stage.validate(root, &mut summary)?;
        }
        Ok(summary)
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::default_pipeline(true)
    }
}
