use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::acid_base::{self, AcidBaseAnalysis};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::labs::{self, LabAnalysis};
use crate::models::ClinicalRecord;
use crate::oxygenation::{self, OxygenationAnalysis};
use crate::treatment::{self, PlanOutcome};
use crate::ventilator::{self, VentilatorAnalysis};

/// Everything the analyzers produce for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub acid_base: Option<AcidBaseAnalysis>,
    pub oxygenation: Option<OxygenationAnalysis>,
    pub ventilator: Option<VentilatorAnalysis>,
    pub labs: Option<LabAnalysis>,
    pub treatment_plan: PlanOutcome,
    /// Critical gas banner, critical lab alerts and non-protective ventilation.
    pub critical_findings: usize,
}

#[instrument(skip_all, fields(
    abg = record.abg.is_some(),
    ventilator = record.ventilator.is_some(),
    labs = record.labs.is_some(),
))]
pub fn interpret(record: &ClinicalRecord, config: &AnalysisConfig) -> Result<Interpretation> {
    record.validate()?;
    config.validate()?;

    let acid_base = record.abg.as_ref().map(acid_base::analyze).transpose()?;
    let oxygenation = record
        .abg
        .as_ref()
        .map(|abg| oxygenation::analyze(abg.pa_o2, abg.fio2))
        .transpose()?;
    let ventilator = record
        .ventilator
        .as_ref()
        .map(|settings| ventilator::analyze(settings, record.abg.as_ref(), config))
        .transpose()?;
    let labs = record.labs.as_ref().map(labs::analyze).transpose()?;
    let treatment_plan = treatment::build_plan(record, config)?;

    let critical_findings = usize::from(acid_base.as_ref().is_some_and(|a| a.critical))
        + usize::from(ventilator.as_ref().is_some_and(|v| !v.is_lung_protective))
        + labs.as_ref().map_or(0, |l| l.critical_count);

    debug!(critical_findings, "Interpretation complete");

    Ok(Interpretation {
        acid_base,
        oxygenation,
        ventilator,
        labs,
        treatment_plan,
        critical_findings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodGasReading, LabPanel, VentilatorSettings};

    fn full_record() -> ClinicalRecord {
        ClinicalRecord {
            abg: Some(BloodGasReading {
                ph: 7.18,
                pa_co2: 55.0,
                pa_o2: 60.0,
                hco3: 18.0,
                anion_gap: 22.0,
                fio2: 50.0,
            }),
            ventilator: Some(VentilatorSettings {
                mode: "AC/VC".to_string(),
                fio2: 60.0,
                peep: 5.0,
                tidal_volume: 400.0,
                respiratory_rate: 12.0,
            }),
            labs: Some(LabPanel {
                potassium: 6.5,
                sodium: 138.0,
                calcium: 8.2,
                magnesium: 1.6,
                lactate: 4.5,
                hemoglobin: 6.8,
                creatinine: 1.8,
            }),
        }
    }

    #[test]
    fn runs_every_present_analyzer() {
        let interpretation = interpret(&full_record(), &AnalysisConfig::default()).unwrap();
        assert!(interpretation.acid_base.is_some());
        assert_eq!(interpretation.oxygenation.as_ref().unwrap().pf_ratio, 120);
        assert!(interpretation.ventilator.as_ref().unwrap().recruitment_alert);
        assert_eq!(interpretation.labs.as_ref().unwrap().critical_count, 2);
        // gas banner + two critical labs; 400 mL is protective
        assert_eq!(interpretation.critical_findings, 3);
        assert!(interpretation.treatment_plan.plan().is_some());
    }

    #[test]
    fn skips_absent_categories() {
        let record = ClinicalRecord {
            labs: full_record().labs,
            ..Default::default()
        };
        let interpretation = interpret(&record, &AnalysisConfig::default()).unwrap();
        assert!(interpretation.acid_base.is_none());
        assert!(interpretation.oxygenation.is_none());
        assert!(interpretation.ventilator.is_none());
        assert!(interpretation.labs.is_some());
    }

    #[test]
    fn empty_record_yields_awaiting_plan() {
        let interpretation =
            interpret(&ClinicalRecord::default(), &AnalysisConfig::default()).unwrap();
        assert_eq!(interpretation.critical_findings, 0);
        assert!(matches!(
            interpretation.treatment_plan,
            PlanOutcome::AwaitingData { .. }
        ));
    }

    #[test]
    fn repeated_calls_serialize_identically() {
        let record = full_record();
        let config = AnalysisConfig::default();
        let first = serde_json::to_vec(&interpret(&record, &config).unwrap()).unwrap();
        let second = serde_json::to_vec(&interpret(&record, &config).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
