//! Rule-based interpretation of ICU arterial blood gas, ventilator and lab values.
//!
//! Each analyzer is a pure function from an input record to an output record.
//! [`interpret`] runs whichever analyzers have data and builds the treatment plan.

pub mod acid_base;
pub mod clinical_note;
pub mod config;
pub mod error;
pub mod interpretation;
pub mod labs;
pub mod models;
pub mod oxygenation;
pub mod thresholds;
pub mod treatment;
pub mod ventilator;

// Re-export commonly used types
pub use clinical_note::render_clinical_note;
pub use config::{AnalysisConfig, Sex, ideal_body_weight_kg};
pub use error::{AnalysisError, Result};
pub use interpretation::{Interpretation, interpret};
pub use models::{
    ActionPriority, Alert, AlertLevel, BloodGasReading, ClinicalRecord, LabPanel, Severity,
    TreatmentAction, VentilatorSettings,
};
pub use treatment::{PlanOutcome, TreatmentPlan, build_plan};
