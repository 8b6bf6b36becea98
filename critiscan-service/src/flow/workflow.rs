use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    context::Context,
    error::{FlowError, Result},
    storage::Session,
    task::{NextAction, Stage, Task, TaskResult},
};

/// A directed graph of stage tasks.
pub struct Workflow {
    id: String,
    tasks: DashMap<Stage, Arc<dyn Task>>,
    edges: Vec<(Stage, Stage)>,
    start: Option<Stage>,
}

impl Workflow {
    /// Run the session's current stage and follow `ContinueAndExecute` chains.
    pub async fn execute_session(&self, session: &mut Session) -> Result<ExecutionResult> {
        loop {
            let result = self
                .execute_single_task(session.current_stage, session.context.clone())
                .await?;
            let stage = result.stage.unwrap_or(session.current_stage);
            session.status_message = result.status_message.clone();

            debug!(
                workflow = %self.id,
                session_id = %session.id,
                stage = %stage,
                next_action = ?result.next_action,
                "Stage finished"
            );

            match &result.next_action {
                NextAction::ContinueAndExecute => match self.find_next_stage(stage) {
                    Some(next) => session.current_stage = next,
                    None => {
                        warn!(stage = %stage, "No stage after ContinueAndExecute, waiting");
                        return Ok(ExecutionResult::waiting(result.response));
                    }
                },
                NextAction::Continue => {
                    if let Some(next) = self.find_next_stage(stage) {
                        session.current_stage = next;
                    }
                    return Ok(ExecutionResult::waiting(result.response));
                }
                NextAction::GoTo(target) => {
                    if !self.tasks.contains_key(target) {
                        return Err(FlowError::TaskNotFound(*target));
                    }
                    session.current_stage = *target;
                    return Ok(ExecutionResult::waiting(result.response));
                }
                NextAction::WaitForInput => {
                    session.current_stage = stage;
                    return Ok(ExecutionResult::waiting(result.response));
                }
                NextAction::End => {
                    session.current_stage = stage;
                    return Ok(ExecutionResult {
                        response: result.response,
                        status: ExecutionStatus::Completed,
                    });
                }
            }
        }
    }

    async fn execute_single_task(&self, stage: Stage, context: Context) -> Result<TaskResult> {
        let task = self
            .tasks
            .get(&stage)
            .map(|entry| entry.clone())
            .ok_or(FlowError::TaskNotFound(stage))?;

        let mut result = task.run(context).await?;
        result.stage = Some(stage);
        Ok(result)
    }

    pub fn find_next_stage(&self, current: Stage) -> Option<Stage> {
        self.edges
            .iter()
            .find(|(from, _)| *from == current)
            .map(|(_, to)| *to)
    }

    pub fn start_stage(&self) -> Option<Stage> {
        self.start
    }
}

pub struct WorkflowBuilder {
    workflow: Workflow,
}

impl WorkflowBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            workflow: Workflow {
                id: id.into(),
                tasks: DashMap::new(),
                edges: Vec::new(),
                start: None,
            },
        }
    }

    /// The first task added becomes the start stage.
    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        let stage = task.stage();
        if self.workflow.start.is_none() {
            self.workflow.start = Some(stage);
        }
        self.workflow.tasks.insert(stage, task);
        self
    }

    pub fn add_edge(mut self, from: Stage, to: Stage) -> Self {
        self.workflow.edges.push((from, to));
        self
    }

    pub fn build(self) -> Workflow {
        self.workflow
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub response: Option<String>,
    pub status: ExecutionStatus,
}

impl ExecutionResult {
    fn waiting(response: Option<String>) -> Self {
        Self {
            response,
            status: ExecutionStatus::WaitingForInput,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    WaitingForInput,
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct RecordingTask {
        stage: Stage,
        next: NextAction,
    }

    #[async_trait]
    impl Task for RecordingTask {
        fn stage(&self) -> Stage {
            self.stage
        }

        async fn run(&self, context: Context) -> Result<TaskResult> {
            let mut visited: Vec<Stage> = context.get("visited").await.unwrap_or_default();
            visited.push(self.stage);
            context.set("visited", visited).await?;
            Ok(TaskResult::new_with_status(
                Some(self.stage.to_string()),
                self.next.clone(),
                Some(format!("{} done", self.stage)),
            ))
        }
    }

    fn task(stage: Stage, next: NextAction) -> Arc<dyn Task> {
        Arc::new(RecordingTask { stage, next })
    }

    #[tokio::test]
    async fn continue_and_execute_runs_until_end() {
        let workflow = WorkflowBuilder::new("test")
            .add_task(task(Stage::Intake, NextAction::ContinueAndExecute))
            .add_task(task(Stage::Interpretation, NextAction::ContinueAndExecute))
            .add_task(task(Stage::ClinicalSummary, NextAction::End))
            .add_edge(Stage::Intake, Stage::Interpretation)
            .add_edge(Stage::Interpretation, Stage::ClinicalSummary)
            .build();
        assert_eq!(workflow.start_stage(), Some(Stage::Intake));

        let mut session = Session::new(None, Stage::Intake);
        let result = workflow.execute_session(&mut session).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(result.response.as_deref(), Some("clinical_summary"));
        assert_eq!(session.current_stage, Stage::ClinicalSummary);
        assert_eq!(session.status_message.as_deref(), Some("clinical_summary done"));
        let visited: Vec<Stage> = session.context.get("visited").await.unwrap();
        assert_eq!(
            visited,
            [Stage::Intake, Stage::Interpretation, Stage::ClinicalSummary]
        );
    }

    #[tokio::test]
    async fn continue_advances_without_running_next() {
        let workflow = WorkflowBuilder::new("test")
            .add_task(task(Stage::Intake, NextAction::Continue))
            .add_task(task(Stage::Interpretation, NextAction::End))
            .add_edge(Stage::Intake, Stage::Interpretation)
            .build();

        let mut session = Session::new(None, Stage::Intake);
        let result = workflow.execute_session(&mut session).await.unwrap();
        assert_eq!(result.status, ExecutionStatus::WaitingForInput);
        assert_eq!(session.current_stage, Stage::Interpretation);
    }

    #[tokio::test]
    async fn wait_for_input_stays_put() {
        let workflow = WorkflowBuilder::new("test")
            .add_task(task(Stage::Intake, NextAction::WaitForInput))
            .build();

        let mut session = Session::new(None, Stage::Intake);
        let result = workflow.execute_session(&mut session).await.unwrap();
        assert_eq!(result.status, ExecutionStatus::WaitingForInput);
        assert_eq!(session.current_stage, Stage::Intake);
    }

    #[tokio::test]
    async fn goto_unknown_stage_fails() {
        let workflow = WorkflowBuilder::new("test")
            .add_task(task(Stage::Intake, NextAction::GoTo(Stage::TreatmentPlan)))
            .build();

        let mut session = Session::new(None, Stage::Intake);
        let err = workflow.execute_session(&mut session).await.unwrap_err();
        assert!(matches!(err, FlowError::TaskNotFound(Stage::TreatmentPlan)));
    }

    #[tokio::test]
    async fn missing_task_is_reported() {
        let workflow = WorkflowBuilder::new("empty").build();
        let mut session = Session::new(None, Stage::Interpretation);
        let err = workflow.execute_session(&mut session).await.unwrap_err();
        assert!(matches!(err, FlowError::TaskNotFound(Stage::Interpretation)));
    }
}
