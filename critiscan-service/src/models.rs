use chrono::{DateTime, Utc};
use critiscan_core::{ClinicalRecord, Interpretation, PlanOutcome};
use serde::{Deserialize, Serialize};

use crate::recognition::ReadingKind;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub patient_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadImageRequest {
    pub kind: ReadingKind,
    /// Raw image bytes, standard base64. A `data:image/...;base64,` prefix is accepted.
    pub image_base64: String,
}

/// An upload accepted by the API but not yet recognised by the intake stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingUpload {
    pub kind: ReadingKind,
    pub image_base64: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    ImageUpload,
    ManualEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub kind: ReadingKind,
    pub label: String,
    pub source: ExtractionSource,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractionRecord {
    pub fn now(kind: ReadingKind, source: ExtractionSource) -> Self {
        Self {
            kind,
            label: kind.label().to_string(),
            source,
            extracted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub patient_id: Option<String>,
    pub status: String,
    pub current_stage: String,
    pub status_message: Option<String>,
    /// Reply from the stage that ran for this request, if any.
    pub message: Option<String>,
    pub record: ClinicalRecord,
    pub extractions: Vec<ExtractionRecord>,
    pub interpretation: Option<Interpretation>,
    pub treatment_plan: Option<PlanOutcome>,
    pub clinical_note: Option<String>,
    pub waiting_for_input: bool,
}
