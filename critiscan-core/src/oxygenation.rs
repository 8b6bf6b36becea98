use serde::{Deserialize, Serialize};

use crate::error::{Result, require_positive};
use crate::models::Severity;
use crate::thresholds::{self, PF_MILD_ARDS, PF_MODERATE_ARDS, PF_SEVERE_ARDS, round_half_up};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArdsStage {
    Severe,
    Moderate,
    Mild,
    Normal,
}

impl ArdsStage {
    pub fn from_pf_ratio(pf_ratio: u32) -> Self {
        if pf_ratio < PF_SEVERE_ARDS {
            ArdsStage::Severe
        } else if pf_ratio < PF_MODERATE_ARDS {
            ArdsStage::Moderate
        } else if pf_ratio < PF_MILD_ARDS {
            ArdsStage::Mild
        } else {
            ArdsStage::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArdsStage::Severe => "Severe ARDS",
            ArdsStage::Moderate => "Moderate ARDS",
            ArdsStage::Mild => "Mild ARDS",
            ArdsStage::Normal => "Normal Oxygenation",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ArdsStage::Severe => Severity::Severe,
            ArdsStage::Moderate => Severity::Moderate,
            ArdsStage::Mild => Severity::Mild,
            ArdsStage::Normal => Severity::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OxygenationAnalysis {
    pub pf_ratio: u32,
    pub stage: ArdsStage,
    pub label: String,
    pub severity: Severity,
    pub critical: bool,
}

/// P/F ratio rounded to the nearest integer. FiO₂ is a percentage and must be positive.
pub fn pf_ratio(pa_o2: f64, fio2_percent: f64) -> Result<u32> {
    Ok(round_half_up(raw_pf_ratio(pa_o2, fio2_percent)?) as u32)
}

/// Unrounded P/F ratio, as used by the treatment plan.
pub fn raw_pf_ratio(pa_o2: f64, fio2_percent: f64) -> Result<f64> {
    let pa_o2 = require_positive("PaO2", pa_o2)?;
    let fio2 = require_positive("FiO2", fio2_percent)?;
    Ok(pa_o2 / (fio2 / 100.0))
}

pub fn analyze(pa_o2: f64, fio2_percent: f64) -> Result<OxygenationAnalysis> {
    let pf_ratio = pf_ratio(pa_o2, fio2_percent)?;
    let stage = ArdsStage::from_pf_ratio(pf_ratio);

    Ok(OxygenationAnalysis {
        pf_ratio,
        stage,
        label: stage.label().to_string(),
        severity: stage.severity(),
        critical: thresholds::is_critical_oxygenation(f64::from(pf_ratio)),
    })
}
