use critiscan_core::AnalysisError;
use thiserror::Error;

use crate::recognition::RecognitionError;

use super::task::Stage;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("No task registered for stage: {0}")]
    TaskNotFound(Stage),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Context error: {0}")]
    ContextError(String),

    #[error("Task execution failed: {0}")]
    TaskExecutionFailed(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid clinical data: {0}")]
    InvalidClinicalData(#[from] AnalysisError),

    #[error("Recognition failed: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;
