use async_trait::async_trait;
use critiscan_core::ClinicalRecord;
use critiscan_core::treatment::EMPTY_STATE_MESSAGE;
use std::sync::Arc;
use tracing::{info, warn};

use crate::flow::{Context, FlowError, NextAction, Result, Stage, Task, TaskResult};
use crate::models::{ExtractionRecord, ExtractionSource, PendingUpload};
use crate::recognition::{ReadingRecognizer, decode_image_base64};
use crate::tasks::session_keys;

/// Collects readings for the session and holds the workflow until analysis is requested.
pub struct IntakeTask {
    recognizer: Arc<dyn ReadingRecognizer>,
}

impl IntakeTask {
    pub fn new(recognizer: Arc<dyn ReadingRecognizer>) -> Self {
        Self { recognizer }
    }

    async fn recognize_pending(
        &self,
        context: &Context,
        record: &mut ClinicalRecord,
        extractions: &mut Vec<ExtractionRecord>,
    ) -> Result<usize> {
        let pending: Vec<PendingUpload> = match context.remove(session_keys::PENDING_UPLOADS).await
        {
            Some(value) => serde_json::from_value(value)?,
            None => return Ok(0),
        };

        for upload in &pending {
            let image = decode_image_base64(&upload.image_base64).map_err(|e| {
                FlowError::TaskExecutionFailed(format!("upload is not valid base64: {}", e))
            })?;

            let reading = self.recognizer.recognize(upload.kind, &image).await?;
            if reading.kind() != upload.kind {
                warn!(
                    expected = ?upload.kind,
                    actual = ?reading.kind(),
                    "Recognizer returned a different reading kind"
                );
                return Err(FlowError::TaskExecutionFailed(format!(
                    "expected {} but recognised {}",
                    upload.kind.label(),
                    reading.kind().label()
                )));
            }
            reading.validate()?;

            record.merge(reading.into_record());
            extractions.push(ExtractionRecord::now(
                upload.kind,
                ExtractionSource::ImageUpload,
            ));
        }

        Ok(pending.len())
    }
}

#[async_trait]
impl Task for IntakeTask {
    fn stage(&self) -> Stage {
        Stage::Intake
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let session_id: String = context
            .get(session_keys::SESSION_ID)
            .await
            .unwrap_or_default();

        let mut record: ClinicalRecord = context
            .get(session_keys::CLINICAL_RECORD)
            .await
            .unwrap_or_default();
        let mut extractions: Vec<ExtractionRecord> = context
            .get(session_keys::EXTRACTIONS)
            .await
            .unwrap_or_default();

        let recognized = self
            .recognize_pending(&context, &mut record, &mut extractions)
            .await?;

        context.set(session_keys::CLINICAL_RECORD, &record).await?;
        context.set(session_keys::EXTRACTIONS, &extractions).await?;
        context.set(session_keys::WORKFLOW_COMPLETED, false).await?;

        let captured = [
            record.abg.is_some(),
            record.ventilator.is_some(),
            record.labs.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count();

        info!(
            session_id = %session_id,
            recognized,
            captured,
            "Intake updated"
        );

        let analysis_requested: bool = context
            .get(session_keys::ANALYSIS_REQUESTED)
            .await
            .unwrap_or(false);

        if record.is_empty() {
            return Ok(TaskResult::new_with_status(
                Some(EMPTY_STATE_MESSAGE.to_string()),
                NextAction::WaitForInput,
                Some("Waiting for ABG, ventilator or lab data".to_string()),
            ));
        }

        if !analysis_requested {
            return Ok(TaskResult::new_with_status(
                Some(format!("{} of 3 data categories captured", captured)),
                NextAction::WaitForInput,
                Some("Request analysis when all available data is entered".to_string()),
            ));
        }

        Ok(TaskResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some(format!("Analyzing {} of 3 data categories", captured)),
        ))
    }
}
