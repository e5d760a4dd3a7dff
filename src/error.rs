use crate::pipeline::Stage;

#[derive(Debug, thiserror::Error)]
pub enum DuckyError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    Input(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("chat error: {0}")]
    Chat(String),

    #[error("stage failed: {stage}: {message}")]
    Stage { stage: Stage, message: String },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DuckyError {
    pub(crate) fn stage(stage: Stage, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }

    /// The stage a pipeline failure happened in, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
