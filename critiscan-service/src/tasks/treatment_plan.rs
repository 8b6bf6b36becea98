use async_trait::async_trait;
use critiscan_core::{AnalysisConfig, ClinicalRecord, PlanOutcome, build_plan};
use tracing::info;

use crate::flow::{Context, FlowError, NextAction, Result, Stage, Task, TaskResult};
use crate::tasks::session_keys;

pub struct TreatmentPlanTask {
    config: AnalysisConfig,
}

impl TreatmentPlanTask {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Task for TreatmentPlanTask {
    fn stage(&self) -> Stage {
        Stage::TreatmentPlan
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let record: ClinicalRecord = context
            .get(session_keys::CLINICAL_RECORD)
            .await
            .ok_or_else(|| FlowError::ContextError("clinical_record not found".to_string()))?;

        let outcome = build_plan(&record, &self.config)?;
        let status = match &outcome {
            PlanOutcome::AwaitingData { message } => message.clone(),
            PlanOutcome::Ready { plan, .. } => {
                info!(
                    immediate = plan.immediate.len(),
                    ventilator = plan.ventilator.len(),
                    medications = plan.medications.len(),
                    monitoring = plan.monitoring.len(),
                    "Treatment plan built"
                );
                format!("{} recommended action(s)", plan.action_count())
            }
        };

        context.set(session_keys::TREATMENT_PLAN, &outcome).await?;

        Ok(TaskResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some(status),
        ))
    }
}
