//! Validation of state files, one module per analysis step.
//!
//! Each step module exposes a `validate` function that checks its group in
//! the container. The [`pipeline`] chains them in analysis order.

pub mod combine_embeddings;
pub mod custom_selections;
pub mod identities;
pub mod inputs;
pub mod pca;
pub mod pipeline;
pub mod quality_control;
pub mod stages;

pub use pipeline::ValidationPipeline;
pub use stages::{
    stage_by_name, CombineEmbeddingsStage, CustomSelectionsStage, InputsStage, PcaStage,
    QualityControlStage, ValidationStage, STAGE_NAMES,
};
