use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{BloodGasReading, Severity};
use crate::oxygenation;
use crate::thresholds::{self, round_half_up};

pub const CRITICAL_BANNER: &str = "Critical values detected - Immediate intervention required";
pub const HIGH_ANION_GAP_NOTE: &str = "High anion gap suggests lactic acidosis, DKA, or uremia";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhClass {
    SevereAcidemia,
    Acidemia,
    // No severe tier above 7.45; the bedside display never had one.
    Alkalemia,
    Normal,
}

impl PhClass {
    pub fn classify(ph: f64) -> Self {
        if thresholds::is_severe_acidemia(ph) {
            PhClass::SevereAcidemia
        } else if thresholds::is_acidemia(ph) {
            PhClass::Acidemia
        } else if thresholds::is_alkalemia(ph) {
            PhClass::Alkalemia
        } else {
            PhClass::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhClass::SevereAcidemia => "Severe Acidemia",
            PhClass::Acidemia => "Acidemia",
            PhClass::Alkalemia => "Alkalemia",
            PhClass::Normal => "Normal pH",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            PhClass::SevereAcidemia => Severity::Severe,
            PhClass::Acidemia | PhClass::Alkalemia => Severity::Mild,
            PhClass::Normal => Severity::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryDisorder {
    RespiratoryAcidosis,
    MetabolicAcidosis,
    RespiratoryAlkalosis,
    MetabolicAlkalosis,
    Mixed,
}

impl PrimaryDisorder {
    /// First match wins, in this order.
    pub fn classify(reading: &BloodGasReading) -> Self {
        let acidemic = thresholds::is_acidemia(reading.ph);
        let alkalemic = thresholds::is_alkalemia(reading.ph);

        if acidemic && thresholds::is_hypercapnic(reading.pa_co2) {
            PrimaryDisorder::RespiratoryAcidosis
        } else if acidemic && thresholds::is_low_bicarbonate(reading.hco3) {
            PrimaryDisorder::MetabolicAcidosis
        } else if alkalemic && thresholds::is_hypocapnic(reading.pa_co2) {
            PrimaryDisorder::RespiratoryAlkalosis
        } else if alkalemic && thresholds::is_high_bicarbonate(reading.hco3) {
            PrimaryDisorder::MetabolicAlkalosis
        } else {
            PrimaryDisorder::Mixed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrimaryDisorder::RespiratoryAcidosis => "Respiratory acidosis",
            PrimaryDisorder::MetabolicAcidosis => "Metabolic acidosis",
            PrimaryDisorder::RespiratoryAlkalosis => "Respiratory alkalosis",
            PrimaryDisorder::MetabolicAlkalosis => "Metabolic alkalosis",
            PrimaryDisorder::Mixed => "Mixed disorder",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompensationStatus {
    Appropriate,
    Inadequate,
}

/// Winter's formula applied to the measured bicarbonate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    pub expected_pa_co2: i64,
    pub range_low: i64,
    pub range_high: i64,
    pub range_label: String,
    pub status: CompensationStatus,
}

impl Compensation {
    pub fn assess(pa_co2: f64, hco3: f64) -> Self {
        let expected = round_half_up(1.5 * hco3 + 8.0) as i64;
        let (low, high) = (expected - 2, expected + 2);
        let status = if pa_co2 >= low as f64 && pa_co2 <= high as f64 {
            CompensationStatus::Appropriate
        } else {
            CompensationStatus::Inadequate
        };

        Self {
            expected_pa_co2: expected,
            range_low: low,
            range_high: high,
            range_label: format!("{} - {}", low, high),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    High,
    Low,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnionGapFinding {
    pub value: f64,
    pub flag: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcidBaseAnalysis {
    pub ph: f64,
    pub ph_class: PhClass,
    pub ph_label: String,
    pub severity: Severity,
    pub primary_disorder: PrimaryDisorder,
    pub primary_label: String,
    pub compensation: Compensation,
    pub pa_co2_trend: Trend,
    pub hco3_trend: Trend,
    pub anion_gap: Option<AnionGapFinding>,
    /// Severe acidemia or a P/F ratio below 200.
    pub critical: bool,
    pub critical_banner: Option<String>,
}

pub fn analyze(reading: &BloodGasReading) -> Result<AcidBaseAnalysis> {
    reading.validate()?;

    let ph_class = PhClass::classify(reading.ph);
    let primary_disorder = PrimaryDisorder::classify(reading);
    let pf_ratio = oxygenation::pf_ratio(reading.pa_o2, reading.fio2)?;
    let critical = thresholds::is_severe_acidemia(reading.ph)
        || thresholds::is_critical_oxygenation(f64::from(pf_ratio));

    let pa_co2_trend = if thresholds::is_hypercapnic(reading.pa_co2) {
        Trend::High
    } else if thresholds::is_hypocapnic(reading.pa_co2) {
        Trend::Low
    } else {
        Trend::Normal
    };
    let hco3_trend = if thresholds::is_low_bicarbonate(reading.hco3) {
        Trend::Low
    } else if thresholds::is_high_bicarbonate(reading.hco3) {
        Trend::High
    } else {
        Trend::Normal
    };

    let anion_gap = thresholds::is_high_anion_gap(reading.anion_gap).then(|| AnionGapFinding {
        value: reading.anion_gap,
        flag: "High".to_string(),
        note: HIGH_ANION_GAP_NOTE.to_string(),
    });

    Ok(AcidBaseAnalysis {
        ph: reading.ph,
        ph_class,
        ph_label: ph_class.label().to_string(),
        severity: ph_class.severity(),
        primary_disorder,
        primary_label: primary_disorder.label().to_string(),
        compensation: Compensation::assess(reading.pa_co2, reading.hco3),
        pa_co2_trend,
        hco3_trend,
        anion_gap,
        critical,
        critical_banner: critical.then(|| CRITICAL_BANNER.to_string()),
    })
}
