use async_trait::async_trait;
use critiscan_core::{AnalysisConfig, ClinicalRecord, interpret};
use tracing::info;

use crate::flow::{Context, FlowError, NextAction, Result, Stage, Task, TaskResult};
use crate::tasks::session_keys;

pub struct InterpretationTask {
    config: AnalysisConfig,
}

impl InterpretationTask {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Task for InterpretationTask {
    fn stage(&self) -> Stage {
        Stage::Interpretation
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let record: ClinicalRecord = context
            .get(session_keys::CLINICAL_RECORD)
            .await
            .ok_or_else(|| FlowError::ContextError("clinical_record not found".to_string()))?;

        let interpretation = interpret(&record, &self.config)?;
        info!(
            critical_findings = interpretation.critical_findings,
            "Clinical record interpreted"
        );

        let status = format!(
            "{} critical finding(s) identified",
            interpretation.critical_findings
        );
        context
            .set(session_keys::INTERPRETATION, &interpretation)
            .await?;

        Ok(TaskResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some(status),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use critiscan_core::{Interpretation, LabPanel};

    #[tokio::test]
    async fn stores_interpretation() {
        let context = Context::new();
        let record = ClinicalRecord {
            labs: Some(LabPanel {
                potassium: 6.5,
                sodium: 138.0,
                calcium: 8.2,
                magnesium: 1.6,
                lactate: 4.5,
                hemoglobin: 6.8,
                creatinine: 1.8,
            }),
            ..Default::default()
        };
        context
            .set(session_keys::CLINICAL_RECORD, &record)
            .await
            .unwrap();

        let result = InterpretationTask::new(AnalysisConfig::default())
            .run(context.clone())
            .await
            .unwrap();
        assert_eq!(result.next_action, NextAction::ContinueAndExecute);

        let stored: Interpretation = context.get(session_keys::INTERPRETATION).await.unwrap();
        assert_eq!(stored.critical_findings, 2);
    }

    #[tokio::test]
    async fn missing_record_is_a_context_error() {
        let err = InterpretationTask::new(AnalysisConfig::default())
            .run(Context::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::ContextError(_)));
    }
}
