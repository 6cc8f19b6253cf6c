use crate::resource::ShaderStageKind;

/// Errors from the draw pipeline.
///
/// None of these are retried: a failing frame step terminates the loop.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shader '{label}' is missing a {stage:?} stage")]
    MissingStage {
        label: String,
        stage: ShaderStageKind,
    },
    #[error("shader '{label}' has more than one {stage:?} stage")]
    DuplicateStage {
        label: String,
        stage: ShaderStageKind,
    },
    #[error("shader '{label}' has an empty {stage:?} stage source")]
    EmptyStage {
        label: String,
        stage: ShaderStageKind,
    },
    #[error("active effect index {index} out of range ({len} effects registered)")]
    EffectIndexOutOfRange { index: usize, len: usize },
    #[error("effect '{effect}' has no buffer {index} ({len} buffers)")]
    BufferIndexOutOfRange {
        effect: String,
        index: usize,
        len: usize,
    },
    #[error("viewport must be non-zero, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },
    #[error("backend failed to create render target '{0}'")]
    TargetCreation(String),
}
