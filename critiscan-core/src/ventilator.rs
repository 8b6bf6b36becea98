use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{AlertLevel, BloodGasReading, VentilatorSettings};
use crate::thresholds::{
    self, PROTECTIVE_TIDAL_VOLUME_PER_KG, fixed_tenth, round_half_up, round_to_tenth,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentilatorRecommendation {
    pub level: AlertLevel,
    pub message: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentilatorAnalysis {
    pub mode: String,
    pub ideal_body_weight_kg: f64,
    pub tidal_volume_per_kg: f64,
    pub is_lung_protective: bool,
    pub target_tidal_volume_ml: u32,
    /// L/min, one decimal
    pub minute_ventilation: f64,
    pub recommendations: Vec<VentilatorRecommendation>,
    /// Safety banner lines; empty when nothing is flagged.
    pub warnings: Vec<String>,
    /// PEEP below 10 with a co-supplied PaO₂ below 80. Not part of `recommendations`.
    pub recruitment_alert: bool,
}

/// Tidal volume per kg of ideal body weight, one decimal.
pub fn tidal_volume_per_kg(tidal_volume: f64, ideal_body_weight_kg: f64) -> f64 {
    round_to_tenth(raw_tidal_volume_per_kg(tidal_volume, ideal_body_weight_kg))
}

pub fn raw_tidal_volume_per_kg(tidal_volume: f64, ideal_body_weight_kg: f64) -> f64 {
    tidal_volume / ideal_body_weight_kg
}

pub fn target_tidal_volume_ml(ideal_body_weight_kg: f64) -> u32 {
    round_half_up(ideal_body_weight_kg * PROTECTIVE_TIDAL_VOLUME_PER_KG) as u32
}

/// L/min to one decimal.
pub fn minute_ventilation(tidal_volume: f64, respiratory_rate: f64) -> f64 {
    fixed_tenth(tidal_volume * respiratory_rate / 1000.0)
}

/// Both the recommendation list and the combined recruitment alert key off low PEEP;
/// only the latter also requires hypoxemia on a co-supplied gas.
pub fn needs_recruitment(settings: &VentilatorSettings, abg: Option<&BloodGasReading>) -> bool {
    thresholds::is_low_peep(settings.peep)
        && abg.is_some_and(|abg| thresholds::is_recruitment_hypoxemia(abg.pa_o2))
}

pub fn analyze(
    settings: &VentilatorSettings,
    abg: Option<&BloodGasReading>,
    config: &AnalysisConfig,
) -> Result<VentilatorAnalysis> {
    settings.validate()?;
    config.validate()?;

    let ibw = config.ideal_body_weight_kg;
    let per_kg = tidal_volume_per_kg(settings.tidal_volume, ibw);
    let is_lung_protective = thresholds::is_lung_protective(per_kg);
    let target = target_tidal_volume_ml(ibw);

    let mut recommendations = Vec::new();
    if !is_lung_protective {
        recommendations.push(VentilatorRecommendation {
            level: AlertLevel::Critical,
            message: format!("↓ Tidal Volume to {} mL (6 mL/kg IBW)", target),
            reason: "Lung-protective ventilation for ARDS".to_string(),
        });
    }
    if thresholds::is_low_peep(settings.peep) {
        recommendations.push(VentilatorRecommendation {
            level: AlertLevel::Important,
            message: "↑ PEEP to 10-12 cmH₂O".to_string(),
            reason: "Improve alveolar recruitment".to_string(),
        });
    }
    if thresholds::is_toxic_fio2(settings.fio2) {
        recommendations.push(VentilatorRecommendation {
            level: AlertLevel::Moderate,
            message: "↓ FiO₂ to <60% if possible".to_string(),
            reason: "Reduce oxygen toxicity risk".to_string(),
        });
    }
    if thresholds::is_low_respiratory_rate(settings.respiratory_rate) {
        recommendations.push(VentilatorRecommendation {
            level: AlertLevel::Moderate,
            message: "↑ Respiratory Rate to 16-20".to_string(),
            reason: "Improve minute ventilation".to_string(),
        });
    }

    let mut warnings = Vec::new();
    if !is_lung_protective {
        warnings.push("Non-protective ventilation detected".to_string());
    }
    if thresholds::is_high_risk_fio2(settings.fio2) {
        warnings.push("High FiO₂ risk".to_string());
    }

    Ok(VentilatorAnalysis {
        mode: settings.mode.clone(),
        ideal_body_weight_kg: ibw,
        tidal_volume_per_kg: per_kg,
        is_lung_protective,
        target_tidal_volume_ml: target,
        minute_ventilation: minute_ventilation(settings.tidal_volume, settings.respiratory_rate),
        recommendations,
        warnings,
        recruitment_alert: needs_recruitment(settings, abg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(tidal_volume: f64) -> VentilatorSettings {
        VentilatorSettings {
            mode: "AC/VC".to_string(),
            fio2: 40.0,
            peep: 10.0,
            tidal_volume,
            respiratory_rate: 18.0,
        }
    }

    #[test]
    fn protective_tidal_volume_has_no_recommendation() {
        let analysis = analyze(&settings(400.0), None, &AnalysisConfig::default()).unwrap();
        assert_eq!(analysis.tidal_volume_per_kg, 5.7);
        assert!(analysis.is_lung_protective);
        assert!(analysis.recommendations.is_empty());
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn large_tidal_volume_targets_420_ml() {
        let analysis = analyze(&settings(500.0), None, &AnalysisConfig::default()).unwrap();
        assert_eq!(analysis.tidal_volume_per_kg, 7.1);
        assert!(!analysis.is_lung_protective);
        assert_eq!(analysis.target_tidal_volume_ml, 420);
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(
            analysis.recommendations[0].message,
            "↓ Tidal Volume to 420 mL (6 mL/kg IBW)"
        );
        assert_eq!(analysis.recommendations[0].level, AlertLevel::Critical);
        assert_eq!(analysis.warnings, ["Non-protective ventilation detected"]);
    }

    #[test]
    fn exactly_six_ml_per_kg_is_protective() {
        let analysis = analyze(&settings(420.0), None, &AnalysisConfig::default()).unwrap();
        assert_eq!(analysis.tidal_volume_per_kg, 6.0);
        assert!(analysis.is_lung_protective);
        // 423 / 70 = 6.04, displayed as 6.0
        let analysis = analyze(&settings(423.0), None, &AnalysisConfig::default()).unwrap();
        assert!(analysis.is_lung_protective);
    }

    #[test]
    fn placeholder_settings_trigger_peep_and_rate() {
        let placeholder = VentilatorSettings {
            mode: "AC/VC".to_string(),
            fio2: 60.0,
            peep: 5.0,
            tidal_volume: 400.0,
            respiratory_rate: 12.0,
        };
        let analysis = analyze(&placeholder, None, &AnalysisConfig::default()).unwrap();
        let messages: Vec<&str> = analysis
            .recommendations
            .iter()
            .map(|r| r.message.as_str())
            .collect();
        // FiO2 of exactly 60 does not trigger the reduction.
        assert_eq!(messages, ["↑ PEEP to 10-12 cmH₂O", "↑ Respiratory Rate to 16-20"]);
        assert_eq!(analysis.minute_ventilation, 4.8);
        // PEEP recommendation fires without any gas; the combined alert does not.
        assert!(!analysis.recruitment_alert);
    }

    #[test]
    fn minute_ventilation_does_not_round_up_stored_ties() {
        assert_eq!(minute_ventilation(400.0, 12.0), 4.8);
        assert_eq!(minute_ventilation(450.0, 9.0), 4.0);
        assert_eq!(minute_ventilation(450.0, 21.0), 9.4);
        let analysis = analyze(
            &VentilatorSettings {
                respiratory_rate: 9.0,
                ..settings(450.0)
            },
            None,
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(analysis.minute_ventilation, 4.0);
    }

    #[test]
    fn recruitment_alert_needs_hypoxemic_gas() {
        let low_peep = VentilatorSettings {
            peep: 5.0,
            ..settings(400.0)
        };
        let hypoxemic = BloodGasReading {
            ph: 7.30,
            pa_co2: 45.0,
            pa_o2: 60.0,
            hco3: 22.0,
            anion_gap: 10.0,
            fio2: 50.0,
        };
        let config = AnalysisConfig::default();
        assert!(analyze(&low_peep, Some(&hypoxemic), &config).unwrap().recruitment_alert);

        let oxygenated = BloodGasReading {
            pa_o2: 85.0,
            ..hypoxemic
        };
        assert!(!analyze(&low_peep, Some(&oxygenated), &config).unwrap().recruitment_alert);
    }

    #[test]
    fn high_fio2_adds_banner_and_recommendation() {
        let analysis = analyze(
            &VentilatorSettings {
                fio2: 90.0,
                ..settings(400.0)
            },
            None,
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(analysis.warnings, ["High FiO₂ risk"]);
        assert_eq!(analysis.recommendations[0].reason, "Reduce oxygen toxicity risk");
    }

    #[test]
    fn injected_body_weight_changes_target() {
        let config = AnalysisConfig::default().with_ideal_body_weight(60.0).unwrap();
        let analysis = analyze(&settings(400.0), None, &config).unwrap();
        assert_eq!(analysis.tidal_volume_per_kg, 6.7);
        assert_eq!(analysis.target_tidal_volume_ml, 360);
        assert!(!analysis.is_lung_protective);
    }
}
