use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{ActionPriority, ClinicalRecord, TreatmentAction};
use crate::oxygenation;
use crate::thresholds;
use crate::ventilator;

pub const EMPTY_STATE_MESSAGE: &str = "Upload clinical data to generate treatment plan";
pub const PLAN_SUMMARY: &str =
    "Comprehensive treatment plan generated based on uploaded clinical data";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub immediate: Vec<TreatmentAction>,
    pub ventilator: Vec<TreatmentAction>,
    pub medications: Vec<TreatmentAction>,
    pub monitoring: Vec<TreatmentAction>,
}

impl TreatmentPlan {
    pub fn action_count(&self) -> usize {
        self.immediate.len() + self.ventilator.len() + self.medications.len() + self.monitoring.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanOutcome {
    /// No category was supplied.
    AwaitingData { message: String },
    Ready { summary: String, plan: TreatmentPlan },
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&TreatmentPlan> {
        match self {
            PlanOutcome::Ready { plan, .. } => Some(plan),
            PlanOutcome::AwaitingData { .. } => None,
        }
    }
}

/// Builds the bucketed action list from the raw record.
///
/// Works from the record rather than from analyzer output. Every condition
/// goes through [`crate::thresholds`], but on the unrounded P/F ratio and
/// Vt/kg, so a value shown as exactly on a cut-off can still trigger here.
pub fn build_plan(record: &ClinicalRecord, config: &AnalysisConfig) -> Result<PlanOutcome> {
    if record.is_empty() {
        return Ok(PlanOutcome::AwaitingData {
            message: EMPTY_STATE_MESSAGE.to_string(),
        });
    }
    record.validate()?;
    config.validate()?;

    let mut plan = TreatmentPlan::default();

    if let Some(abg) = &record.abg {
        if thresholds::is_severe_acidemia(abg.ph) {
            plan.immediate.push(TreatmentAction::new(
                ActionPriority::Critical,
                "Address severe acidemia",
                "Consider sodium bicarbonate if pH <7.1",
                "Immediate",
            ));
        }
        let pf_ratio = oxygenation::raw_pf_ratio(abg.pa_o2, abg.fio2)?;
        if thresholds::is_critical_oxygenation(pf_ratio) {
            plan.immediate.push(TreatmentAction::new(
                ActionPriority::Critical,
                "ARDS management protocol",
                "Lung-protective ventilation, prone positioning",
                "Immediate",
            ));
        }
    }

    if let Some(settings) = &record.ventilator {
        let ibw = config.ideal_body_weight_kg;
        let per_kg = ventilator::raw_tidal_volume_per_kg(settings.tidal_volume, ibw);
        if !thresholds::is_lung_protective(per_kg) {
            plan.ventilator.push(TreatmentAction::new(
                ActionPriority::High,
                "Reduce tidal volume",
                format!(
                    "Target 6 mL/kg IBW ({} mL)",
                    ventilator::target_tidal_volume_ml(ibw)
                ),
                "Now",
            ));
        }
        if ventilator::needs_recruitment(settings, record.abg.as_ref()) {
            plan.ventilator.push(TreatmentAction::new(
                ActionPriority::High,
                "Increase PEEP",
                "Titrate PEEP to 10-12 cmH₂O for recruitment",
                "Within 15 min",
            ));
        }
    }

    if let Some(labs) = &record.labs {
        if thresholds::is_hyperkalemia(labs.potassium) {
            plan.immediate.push(TreatmentAction::new(
                ActionPriority::Critical,
                "Treat hyperkalemia",
                "Calcium gluconate 1g IV → Insulin/D50 → Albuterol",
                "Immediate",
            ));
        }
        if thresholds::is_lactic_acidosis(labs.lactate) {
            plan.immediate.push(TreatmentAction::new(
                ActionPriority::Critical,
                "Sepsis protocol",
                "Blood cultures × 2, broad-spectrum antibiotics",
                "Within 1 hour",
            ));
        }
        if thresholds::is_hypocalcemia(labs.calcium) {
            plan.medications.push(TreatmentAction::new(
                ActionPriority::Moderate,
                "Correct hypocalcemia",
                "Calcium gluconate 1-2g IV over 10 minutes",
                "Within 30 min",
            ));
        }
        if thresholds::is_hypomagnesemia(labs.magnesium) {
            plan.medications.push(TreatmentAction::new(
                ActionPriority::Moderate,
                "Magnesium replacement",
                "MgSO₄ 2-4g IV over 4 hours",
                "Within 1 hour",
            ));
        }
    }

    plan.monitoring = config.monitoring.clone();

    debug!(
        immediate = plan.immediate.len(),
        ventilator = plan.ventilator.len(),
        medications = plan.medications.len(),
        "Treatment plan built"
    );

    Ok(PlanOutcome::Ready {
        summary: PLAN_SUMMARY.to_string(),
        plan,
    })
}
