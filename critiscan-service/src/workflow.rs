use critiscan_core::{AnalysisConfig, ClinicalRecord};
use std::sync::Arc;

use crate::flow::{FlowRunner, Result, Session, SessionStorage, Stage, Workflow, WorkflowBuilder};
use crate::recognition::ReadingRecognizer;
use crate::tasks::{
    ClinicalSummaryTask, IntakeTask, InterpretationTask, TreatmentPlanTask, session_keys,
};

pub fn build_intake_workflow(
    recognizer: Arc<dyn ReadingRecognizer>,
    config: AnalysisConfig,
) -> Workflow {
    WorkflowBuilder::new("icu_intake")
        .add_task(Arc::new(IntakeTask::new(recognizer)))
        .add_task(Arc::new(InterpretationTask::new(config.clone())))
        .add_task(Arc::new(TreatmentPlanTask::new(config)))
        .add_task(Arc::new(ClinicalSummaryTask))
        .add_edge(Stage::Intake, Stage::Interpretation)
        .add_edge(Stage::Interpretation, Stage::TreatmentPlan)
        .add_edge(Stage::TreatmentPlan, Stage::ClinicalSummary)
        .build()
}

pub async fn create_intake_session(patient_id: Option<String>) -> Result<Session> {
    let session = Session::new(patient_id, Stage::Intake);
    session
        .context
        .set(session_keys::SESSION_ID, &session.id)
        .await?;
    session
        .context
        .set(session_keys::CLINICAL_RECORD, ClinicalRecord::default())
        .await?;
    Ok(session)
}

pub fn create_flow_runner(
    session_storage: Arc<dyn SessionStorage>,
    recognizer: Arc<dyn ReadingRecognizer>,
    config: AnalysisConfig,
) -> FlowRunner {
    let workflow = Arc::new(build_intake_workflow(recognizer, config));
    FlowRunner::new(workflow, session_storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{ExecutionStatus, InMemorySessionStorage};
    use crate::recognition::{FixedValueRecognizer, ReadingKind};

    #[tokio::test]
    async fn runs_to_clinical_summary_once_requested() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let runner = create_flow_runner(
            storage.clone(),
            Arc::new(FixedValueRecognizer),
            AnalysisConfig::default(),
        );

        let session = create_intake_session(Some("bed-12".to_string()))
            .await
            .unwrap();
        let id = session.id.clone();
        let record = FixedValueRecognizer::reading_for(ReadingKind::Abg).into_record();
        session
            .context
            .set(session_keys::CLINICAL_RECORD, &record)
            .await
            .unwrap();
        storage.save(session).await.unwrap();

        let waiting = runner.run(&id).await.unwrap();
        assert_eq!(waiting.status, ExecutionStatus::WaitingForInput);

        let session = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(session.current_stage, Stage::Intake);
        session
            .context
            .set(session_keys::ANALYSIS_REQUESTED, true)
            .await
            .unwrap();
        storage.save(session).await.unwrap();

        let done = runner.run(&id).await.unwrap();
        assert_eq!(done.status, ExecutionStatus::Completed);
        assert!(done.response.unwrap().contains("ABG INTERPRETATION"));

        let session = storage.get(&id).await.unwrap().unwrap();
        assert_eq!(session.current_stage, Stage::ClinicalSummary);
        assert!(session.context.get_raw(session_keys::TREATMENT_PLAN).await.is_some());
    }
}
