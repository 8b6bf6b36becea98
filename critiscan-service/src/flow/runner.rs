//! Load a session, run its current stage chain, save it back.

use std::sync::Arc;

use super::{
    error::{FlowError, Result},
    storage::SessionStorage,
    workflow::{ExecutionResult, Workflow},
};

#[derive(Clone)]
pub struct FlowRunner {
    workflow: Arc<Workflow>,
    storage: Arc<dyn SessionStorage>,
}

impl FlowRunner {
    pub fn new(workflow: Arc<Workflow>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { workflow, storage }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub async fn run(&self, session_id: &str) -> Result<ExecutionResult> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        let result = self.workflow.execute_session(&mut session).await?;

        // Persist so the next request resumes where this one stopped.
        self.storage.save(session).await?;

        Ok(result)
    }
}
