use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Alert, AlertLevel, LabPanel};
use crate::thresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Analyte {
    Potassium,
    Sodium,
    Calcium,
    Magnesium,
    Lactate,
    Hemoglobin,
    Creatinine,
}

impl Analyte {
    pub const ALL: [Analyte; 7] = [
        Analyte::Potassium,
        Analyte::Sodium,
        Analyte::Calcium,
        Analyte::Magnesium,
        Analyte::Lactate,
        Analyte::Hemoglobin,
        Analyte::Creatinine,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Analyte::Potassium => "Potassium",
            Analyte::Sodium => "Sodium",
            Analyte::Calcium => "Calcium",
            Analyte::Magnesium => "Magnesium",
            Analyte::Lactate => "Lactate",
            Analyte::Hemoglobin => "Hemoglobin",
            Analyte::Creatinine => "Creatinine",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Analyte::Potassium | Analyte::Sodium => "mEq/L",
            Analyte::Calcium | Analyte::Magnesium | Analyte::Creatinine => "mg/dL",
            Analyte::Lactate => "mmol/L",
            Analyte::Hemoglobin => "g/dL",
        }
    }

    /// Display range only; alerting uses [`crate::thresholds`].
    pub fn reference_range(&self) -> (f64, f64) {
        match self {
            Analyte::Potassium => (3.5, 5.0),
            Analyte::Sodium => (135.0, 145.0),
            Analyte::Calcium => (8.5, 10.5),
            Analyte::Magnesium => (1.8, 2.4),
            Analyte::Lactate => (0.5, 2.0),
            Analyte::Hemoglobin => (12.0, 16.0),
            Analyte::Creatinine => (0.7, 1.3),
        }
    }

    pub fn value_in(&self, panel: &LabPanel) -> f64 {
        match self {
            Analyte::Potassium => panel.potassium,
            Analyte::Sodium => panel.sodium,
            Analyte::Calcium => panel.calcium,
            Analyte::Magnesium => panel.magnesium,
            Analyte::Lactate => panel.lactate,
            Analyte::Hemoglobin => panel.hemoglobin,
            Analyte::Creatinine => panel.creatinine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabStatus {
    Low,
    Normal,
    High,
}

pub fn lab_status(value: f64, (low, high): (f64, f64)) -> LabStatus {
    if value < low {
        LabStatus::Low
    } else if value > high {
        LabStatus::High
    } else {
        LabStatus::Normal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub analyte: Analyte,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: LabStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

struct AlertRule {
    analyte: Analyte,
    level: AlertLevel,
    fires: fn(f64) -> bool,
    symbol: &'static str,
    finding: &'static str,
    treatment: &'static str,
    badge: Option<&'static str>,
    note: Option<&'static str>,
}

// Emission order of alerts follows this table.
const ALERT_RULES: [AlertRule; 5] = [
    AlertRule {
        analyte: Analyte::Potassium,
        level: AlertLevel::Critical,
        fires: thresholds::is_hyperkalemia,
        symbol: "K⁺",
        finding: "Severe hyperkalemia",
        treatment: "Calcium gluconate 1g IV, insulin/D50, albuterol",
        badge: Some("Critical"),
        note: Some("Calcium stabilizes cardiac membranes (priority #1)"),
    },
    AlertRule {
        analyte: Analyte::Lactate,
        level: AlertLevel::Critical,
        fires: thresholds::is_lactic_acidosis,
        symbol: "Lactate",
        finding: "Severe lactic acidosis",
        treatment: "Sepsis protocol, blood cultures, antibiotics",
        badge: Some("Critical"),
        note: Some("Lactate >4 suggests tissue hypoperfusion"),
    },
    AlertRule {
        analyte: Analyte::Hemoglobin,
        level: AlertLevel::Important,
        fires: thresholds::is_severe_anemia,
        symbol: "Hgb",
        finding: "Severe anemia",
        treatment: "Consider transfusion if symptomatic",
        badge: Some("Severe"),
        note: Some("Consider transfusion threshold and patient symptoms"),
    },
    AlertRule {
        analyte: Analyte::Calcium,
        level: AlertLevel::Moderate,
        fires: thresholds::is_hypocalcemia,
        symbol: "Ca²⁺",
        finding: "Hypocalcemia",
        treatment: "Calcium gluconate 1-2g IV",
        badge: None,
        note: None,
    },
    AlertRule {
        analyte: Analyte::Magnesium,
        level: AlertLevel::Moderate,
        fires: thresholds::is_hypomagnesemia,
        symbol: "Mg²⁺",
        finding: "Hypomagnesemia",
        treatment: "MgSO₄ 2-4g IV",
        badge: None,
        note: None,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabAnalysis {
    pub results: Vec<LabResult>,
    pub alerts: Vec<Alert>,
    pub notes: Vec<String>,
    pub critical_count: usize,
    pub critical_banner: Option<String>,
}

pub fn analyze(panel: &LabPanel) -> Result<LabAnalysis> {
    panel.validate()?;

    let mut alerts = Vec::new();
    let mut notes = Vec::new();
    let mut badges = Vec::new();

    for rule in &ALERT_RULES {
        let value = rule.analyte.value_in(panel);
        if !(rule.fires)(value) {
            continue;
        }
        alerts.push(Alert {
            level: rule.level,
            message: format!("{} {} → {}", rule.symbol, value, rule.finding),
            treatment: rule.treatment.to_string(),
        });
        if let Some(badge) = rule.badge {
            badges.push((rule.analyte, badge));
        }
        if let Some(note) = rule.note {
            notes.push(note.to_string());
        }
    }

    let results = Analyte::ALL
        .iter()
        .map(|analyte| {
            let value = analyte.value_in(panel);
            LabResult {
                analyte: *analyte,
                name: analyte.name().to_string(),
                value,
                unit: analyte.unit().to_string(),
                status: lab_status(value, analyte.reference_range()),
                badge: badges
                    .iter()
                    .find(|(flagged, _)| flagged == analyte)
                    .map(|(_, badge)| badge.to_string()),
            }
        })
        .collect();

    let critical_count = count_critical(&alerts);

    Ok(LabAnalysis {
        results,
        alerts,
        notes,
        critical_count,
        critical_banner: (critical_count > 0)
            .then(|| format!("{} critical value(s) detected", critical_count)),
    })
}

pub fn count_critical(alerts: &[Alert]) -> usize {
    alerts
        .iter()
        .filter(|alert| alert.level == AlertLevel::Critical)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_panel() -> LabPanel {
        LabPanel {
            potassium: 4.2,
            sodium: 140.0,
            calcium: 9.4,
            magnesium: 2.0,
            lactate: 1.1,
            hemoglobin: 13.5,
            creatinine: 0.9,
        }
    }

    fn placeholder_panel() -> LabPanel {
        LabPanel {
            potassium: 6.5,
            sodium: 138.0,
            calcium: 8.2,
            magnesium: 1.6,
            lactate: 4.5,
            hemoglobin: 6.8,
            creatinine: 1.8,
        }
    }

    #[test]
    fn hyperkalemia_has_exact_directive() {
        let analysis = analyze(&LabPanel {
            potassium: 6.5,
            ..normal_panel()
        })
        .unwrap();
        assert_eq!(analysis.alerts.len(), 1);
        let alert = &analysis.alerts[0];
        assert_eq!(alert.level, AlertLevel::Critical);
        assert_eq!(alert.message, "K⁺ 6.5 → Severe hyperkalemia");
        assert_eq!(alert.treatment, "Calcium gluconate 1g IV, insulin/D50, albuterol");
        assert_eq!(analysis.critical_count, 1);
    }

    #[test]
    fn potassium_just_below_threshold_is_quiet() {
        let analysis = analyze(&LabPanel {
            potassium: 5.9,
            ..normal_panel()
        })
        .unwrap();
        assert!(analysis.alerts.is_empty());
        assert!(analysis.critical_banner.is_none());
        assert_eq!(analysis.results[0].status, LabStatus::High);
    }

    #[test]
    fn alerts_keep_table_order() {
        let analysis = analyze(&placeholder_panel()).unwrap();
        let levels: Vec<AlertLevel> = analysis.alerts.iter().map(|a| a.level).collect();
        assert_eq!(
            levels,
            [
                AlertLevel::Critical,
                AlertLevel::Critical,
                AlertLevel::Important,
                AlertLevel::Moderate,
                AlertLevel::Moderate,
            ]
        );
        assert_eq!(analysis.alerts[2].message, "Hgb 6.8 → Severe anemia");
        assert_eq!(analysis.alerts[4].treatment, "MgSO₄ 2-4g IV");
        assert_eq!(analysis.critical_count, 2);
        assert_eq!(
            analysis.critical_banner.as_deref(),
            Some("2 critical value(s) detected")
        );
        assert_eq!(analysis.notes.len(), 3);
    }

    #[test]
    fn status_uses_reference_ranges() {
        let analysis = analyze(&placeholder_panel()).unwrap();
        let status = |analyte: Analyte| {
            analysis
                .results
                .iter()
                .find(|r| r.analyte == analyte)
                .map(|r| r.status)
                .unwrap()
        };
        assert_eq!(status(Analyte::Sodium), LabStatus::Normal);
        assert_eq!(status(Analyte::Calcium), LabStatus::Low);
        assert_eq!(status(Analyte::Creatinine), LabStatus::High);
        assert_eq!(status(Analyte::Hemoglobin), LabStatus::Low);
    }

    #[test]
    fn badges_only_on_flagged_analytes() {
        let analysis = analyze(&placeholder_panel()).unwrap();
        let badge = |analyte: Analyte| {
            analysis
                .results
                .iter()
                .find(|r| r.analyte == analyte)
                .and_then(|r| r.badge.clone())
        };
        assert_eq!(badge(Analyte::Potassium).as_deref(), Some("Critical"));
        assert_eq!(badge(Analyte::Hemoglobin).as_deref(), Some("Severe"));
        assert_eq!(badge(Analyte::Calcium), None);
    }

    #[test]
    fn boundaries_match_bedside_rules() {
        assert_eq!(lab_status(3.5, Analyte::Potassium.reference_range()), LabStatus::Normal);
        assert_eq!(lab_status(5.0, Analyte::Potassium.reference_range()), LabStatus::Normal);
        let analysis = analyze(&LabPanel {
            hemoglobin: 7.0,
            calcium: 8.5,
            magnesium: 1.8,
            ..normal_panel()
        })
        .unwrap();
        assert_eq!(analysis.alerts.len(), 1);
        assert_eq!(analysis.alerts[0].level, AlertLevel::Important);
    }
}
