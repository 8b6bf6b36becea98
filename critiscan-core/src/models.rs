use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, require_finite, require_non_negative, require_positive};

/// Arterial blood gas panel. FiO₂ is stored as a percentage (21–100), not a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodGasReading {
    #[serde(alias = "pH")]
    pub ph: f64,
    /// mmHg
    #[serde(alias = "paco2", alias = "paCO2")]
    pub pa_co2: f64,
    /// mmHg
    #[serde(alias = "pao2", alias = "paO2")]
    pub pa_o2: f64,
    /// mEq/L
    pub hco3: f64,
    #[serde(alias = "anionGap")]
    pub anion_gap: f64,
    /// Percent
    pub fio2: f64,
}

impl BloodGasReading {
    pub fn validate(&self) -> Result<()> {
        require_finite("pH", self.ph)?;
        require_positive("PaCO2", self.pa_co2)?;
        require_positive("PaO2", self.pa_o2)?;
        require_positive("HCO3", self.hco3)?;
        require_finite("anion gap", self.anion_gap)?;
        require_positive("FiO2", self.fio2)?;
        warn_if_fio2_out_of_range(self.fio2);
        Ok(())
    }
}

/// Ventilator display values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentilatorSettings {
    /// Ventilation mode as shown on the display, e.g. "AC/VC".
    pub mode: String,
    /// Percent
    pub fio2: f64,
    /// cmH₂O
    pub peep: f64,
    /// mL
    #[serde(alias = "tidalVolume")]
    pub tidal_volume: f64,
    /// Breaths per minute
    #[serde(alias = "respiratoryRate")]
    pub respiratory_rate: f64,
}

impl VentilatorSettings {
    pub fn validate(&self) -> Result<()> {
        require_positive("FiO2", self.fio2)?;
        require_non_negative("PEEP", self.peep)?;
        require_positive("tidal volume", self.tidal_volume)?;
        require_positive("respiratory rate", self.respiratory_rate)?;
        warn_if_fio2_out_of_range(self.fio2);
        Ok(())
    }
}

/// Electrolyte and metabolic panel. Units are fixed per analyte, see [`crate::labs::Analyte::unit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabPanel {
    pub potassium: f64,
    pub sodium: f64,
    pub calcium: f64,
    pub magnesium: f64,
    pub lactate: f64,
    pub hemoglobin: f64,
    pub creatinine: f64,
}

impl LabPanel {
    pub fn validate(&self) -> Result<()> {
        require_finite("potassium", self.potassium)?;
        require_finite("sodium", self.sodium)?;
        require_finite("calcium", self.calcium)?;
        require_finite("magnesium", self.magnesium)?;
        require_finite("lactate", self.lactate)?;
        require_finite("hemoglobin", self.hemoglobin)?;
        require_finite("creatinine", self.creatinine)?;
        Ok(())
    }
}

/// Any subset of the three data categories. An absent category means "skip that analyzer".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abg: Option<BloodGasReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ventilator: Option<VentilatorSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labs: Option<LabPanel>,
}

impl ClinicalRecord {
    pub fn is_empty(&self) -> bool {
        self.abg.is_none() && self.ventilator.is_none() && self.labs.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(abg) = &self.abg {
            abg.validate()?;
        }
        if let Some(ventilator) = &self.ventilator {
            ventilator.validate()?;
        }
        if let Some(labs) = &self.labs {
            labs.validate()?;
        }
        Ok(())
    }

    /// Overlay the categories present in `other` onto this record.
    pub fn merge(&mut self, other: ClinicalRecord) {
        if other.abg.is_some() {
            self.abg = other.abg;
        }
        if other.ventilator.is_some() {
            self.ventilator = other.ventilator;
        }
        if other.labs.is_some() {
            self.labs = other.labs;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Important,
    Moderate,
}

/// A triggered threshold with its paired treatment directive. Alerts keep emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub treatment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Critical,
    High,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentAction {
    pub priority: ActionPriority,
    pub action: String,
    pub detail: String,
    pub timeframe: String,
}

impl TreatmentAction {
    pub fn new(
        priority: ActionPriority,
        action: impl Into<String>,
        detail: impl Into<String>,
        timeframe: impl Into<String>,
    ) -> Self {
        Self {
            priority,
            action: action.into(),
            detail: detail.into(),
            timeframe: timeframe.into(),
        }
    }
}

/// Display severity shared by the pH and ARDS classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Severe,
    Moderate,
    Mild,
    Normal,
}

fn warn_if_fio2_out_of_range(fio2: f64) {
    if !(21.0..=100.0).contains(&fio2) {
        warn!(fio2, "FiO2 outside 21-100%, check that it was entered as a percentage");
    }
}
