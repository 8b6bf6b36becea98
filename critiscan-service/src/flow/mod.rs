//! Session-based task graph driving the intake workflow.

pub mod context;
pub mod error;
pub mod runner;
pub mod storage;
pub mod task;
pub mod workflow;

pub use context::Context;
pub use error::{FlowError, Result};
pub use runner::FlowRunner;
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use task::{NextAction, Stage, Task, TaskResult};
pub use workflow::{ExecutionResult, ExecutionStatus, Workflow, WorkflowBuilder};
