use async_trait::async_trait;
use critiscan_core::{Interpretation, render_clinical_note};
use tracing::info;

use crate::flow::{Context, FlowError, NextAction, Result, Stage, Task, TaskResult};
use crate::tasks::session_keys;

/// Renders the handoff note and finishes the workflow.
pub struct ClinicalSummaryTask;

#[async_trait]
impl Task for ClinicalSummaryTask {
    fn stage(&self) -> Stage {
        Stage::ClinicalSummary
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let interpretation: Interpretation = context
            .get(session_keys::INTERPRETATION)
            .await
            .ok_or_else(|| FlowError::ContextError("interpretation not found".to_string()))?;

        let note = render_clinical_note(&interpretation);
        info!(note_length = note.len(), "Clinical note rendered");

        context.set(session_keys::CLINICAL_NOTE, &note).await?;
        context.set(session_keys::WORKFLOW_COMPLETED, true).await?;

        Ok(TaskResult::new_with_status(
            Some(note),
            NextAction::End,
            Some("Clinical summary ready".to_string()),
        ))
    }
}
