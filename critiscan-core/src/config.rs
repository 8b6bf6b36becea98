use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::models::{ActionPriority, TreatmentAction};

pub const DEFAULT_IDEAL_BODY_WEIGHT_KG: f64 = 70.0;

/// Call-time knobs for the analyzers. `Default` reproduces the fixed bedside behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub ideal_body_weight_kg: f64,
    /// Follow-up actions appended to every treatment plan.
    pub monitoring: Vec<TreatmentAction>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ideal_body_weight_kg: DEFAULT_IDEAL_BODY_WEIGHT_KG,
            monitoring: default_monitoring(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_ideal_body_weight(mut self, kg: f64) -> Result<Self> {
        if !kg.is_finite() || kg <= 0.0 {
            return Err(AnalysisError::InvalidIdealBodyWeight(kg));
        }
        self.ideal_body_weight_kg = kg;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let kg = self.ideal_body_weight_kg;
        if !kg.is_finite() || kg <= 0.0 {
            return Err(AnalysisError::InvalidIdealBodyWeight(kg));
        }
        Ok(())
    }
}

pub fn default_monitoring() -> Vec<TreatmentAction> {
    vec![
        TreatmentAction::new(
            ActionPriority::High,
            "Repeat ABG",
            "Check pH, PaCO₂ response to interventions",
            "30 minutes",
        ),
        TreatmentAction::new(
            ActionPriority::Moderate,
            "Basic metabolic panel",
            "Monitor K⁺, Ca²⁺, Mg²⁺ after replacements",
            "1-2 hours",
        ),
        TreatmentAction::new(
            ActionPriority::Moderate,
            "Lactate trend",
            "Serial lactates q2h if elevated",
            "2 hours",
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// ARDSNet predicted body weight from height.
pub fn ideal_body_weight_kg(sex: Sex, height_cm: f64) -> Result<f64> {
    let base = match sex {
        Sex::Male => 50.0,
        Sex::Female => 45.5,
    };
    let kg = base + 0.91 * (height_cm - 152.4);
    if !kg.is_finite() || kg <= 0.0 {
        return Err(AnalysisError::InvalidIdealBodyWeight(kg));
    }
    Ok(kg)
}
