use thiserror::Error;

use crate::app::runtime::PipelineError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to set up api client: {0}")]
    Runtime(String),
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
    #[error("failed to render output: {0}")]
    Render(String),
}

impl AppError {
    pub fn logging_init<E: std::fmt::Display>(error: E) -> Self {
        Self::LoggingInit(error.to_string())
    }

    pub fn config<E: std::fmt::Display>(error: E) -> Self {
        Self::Config(error.to_string())
    }

    pub fn runtime<E: std::fmt::Display>(error: E) -> Self {
        Self::Runtime(error.to_string())
    }

    pub fn render<E: std::fmt::Display>(error: E) -> Self {
        Self::Render(error.to_string())
    }
}
