pub mod clinical_summary;
pub mod intake;
pub mod interpretation;
pub mod treatment_plan;

pub use clinical_summary::ClinicalSummaryTask;
pub use intake::IntakeTask;
pub use interpretation::InterpretationTask;
pub use treatment_plan::TreatmentPlanTask;

/// Context keys shared by the tasks and the HTTP layer.
pub mod session_keys {
    pub const SESSION_ID: &str = "session_id";
    pub const CLINICAL_RECORD: &str = "clinical_record";
    pub const PENDING_UPLOADS: &str = "pending_uploads";
    pub const EXTRACTIONS: &str = "extractions";
    pub const ANALYSIS_REQUESTED: &str = "analysis_requested";
    pub const INTERPRETATION: &str = "interpretation";
    pub const TREATMENT_PLAN: &str = "treatment_plan";
    pub const CLINICAL_NOTE: &str = "clinical_note";
    pub const WORKFLOW_COMPLETED: &str = "workflow_completed";
}
