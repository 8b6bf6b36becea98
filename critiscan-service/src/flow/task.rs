use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{context::Context, error::Result};

/// Steps of the intake workflow, in their default order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    Interpretation,
    TreatmentPlan,
    ClinicalSummary,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Intake => "intake",
            Stage::Interpretation => "interpretation",
            Stage::TreatmentPlan => "treatment_plan",
            Stage::ClinicalSummary => "clinical_summary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a task execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Response to send to the clinician
    pub response: Option<String>,
    pub next_action: NextAction,
    /// Short progress line kept on the session
    pub status_message: Option<String>,
    /// Filled in by the workflow with the stage that produced this result
    #[serde(skip)]
    pub stage: Option<Stage>,
}

impl TaskResult {
    pub fn new(response: Option<String>, next_action: NextAction) -> Self {
        Self {
            response,
            next_action,
            status_message: None,
            stage: None,
        }
    }

    pub fn new_with_status(
        response: Option<String>,
        next_action: NextAction,
        status_message: Option<String>,
    ) -> Self {
        Self {
            response,
            next_action,
            status_message,
            stage: None,
        }
    }
}

/// Defines what should happen after a task completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Move to the next stage but return control to the caller
    Continue,
    /// Move to the next stage and run it immediately
    ContinueAndExecute,
    /// Jump to a specific stage
    GoTo(Stage),
    /// Stay on this stage until more data arrives
    WaitForInput,
    End,
}

#[async_trait]
pub trait Task: Send + Sync {
    fn stage(&self) -> Stage;

    async fn run(&self, context: Context) -> Result<TaskResult>;
}
