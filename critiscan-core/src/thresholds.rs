//! Clinical cut-offs shared by the per-category analyzers and the treatment plan.
//!
//! Every trigger condition lives here exactly once. The display analyzers and
//! [`crate::treatment::build_plan`] call the same predicates, so a threshold
//! cannot change in one place and silently stay put in the other.
//!
//! The analyzers pass the rounded values they show; the plan passes the
//! unrounded ones. Near a cut-off the two can disagree (423 mL at 70 kg is
//! 6.04 mL/kg, shown as 6.0).

pub const SEVERE_ACIDEMIA_PH: f64 = 7.20;
pub const ACIDEMIA_PH: f64 = 7.35;
pub const ALKALEMIA_PH: f64 = 7.45;

/// mmHg
pub const PACO2_LOW: f64 = 35.0;
/// mmHg
pub const PACO2_HIGH: f64 = 45.0;
/// mEq/L
pub const HCO3_LOW: f64 = 22.0;
/// mEq/L
pub const HCO3_HIGH: f64 = 26.0;
pub const ANION_GAP_HIGH: f64 = 12.0;

pub const PF_SEVERE_ARDS: u32 = 100;
pub const PF_MODERATE_ARDS: u32 = 200;
pub const PF_MILD_ARDS: u32 = 300;

pub const HYPERKALEMIA_K: f64 = 6.0;
pub const LACTIC_ACIDOSIS_LACTATE: f64 = 4.0;
pub const SEVERE_ANEMIA_HGB: f64 = 7.0;
pub const HYPOCALCEMIA_CA: f64 = 8.5;
pub const HYPOMAGNESEMIA_MG: f64 = 1.8;

/// mL per kg of ideal body weight
pub const PROTECTIVE_TIDAL_VOLUME_PER_KG: f64 = 6.0;
/// cmH₂O
pub const MIN_PEEP: f64 = 10.0;
/// mmHg
pub const RECRUITMENT_PAO2: f64 = 80.0;
/// Percent
pub const FIO2_TOXICITY: f64 = 60.0;
/// Percent
pub const FIO2_HIGH_RISK: f64 = 80.0;
/// Breaths per minute
pub const MIN_RESPIRATORY_RATE: f64 = 16.0;

pub fn is_severe_acidemia(ph: f64) -> bool {
    ph < SEVERE_ACIDEMIA_PH
}

pub fn is_acidemia(ph: f64) -> bool {
    ph < ACIDEMIA_PH
}

pub fn is_alkalemia(ph: f64) -> bool {
    ph > ALKALEMIA_PH
}

pub fn is_hypercapnic(pa_co2: f64) -> bool {
    pa_co2 > PACO2_HIGH
}

pub fn is_hypocapnic(pa_co2: f64) -> bool {
    pa_co2 < PACO2_LOW
}

pub fn is_low_bicarbonate(hco3: f64) -> bool {
    hco3 < HCO3_LOW
}

pub fn is_high_bicarbonate(hco3: f64) -> bool {
    hco3 > HCO3_HIGH
}

pub fn is_high_anion_gap(anion_gap: f64) -> bool {
    anion_gap > ANION_GAP_HIGH
}

pub fn is_critical_oxygenation(pf_ratio: f64) -> bool {
    pf_ratio < f64::from(PF_MODERATE_ARDS)
}

pub fn is_hyperkalemia(potassium: f64) -> bool {
    potassium >= HYPERKALEMIA_K
}

pub fn is_lactic_acidosis(lactate: f64) -> bool {
    lactate >= LACTIC_ACIDOSIS_LACTATE
}

pub fn is_severe_anemia(hemoglobin: f64) -> bool {
    hemoglobin <= SEVERE_ANEMIA_HGB
}

pub fn is_hypocalcemia(calcium: f64) -> bool {
    calcium < HYPOCALCEMIA_CA
}

pub fn is_hypomagnesemia(magnesium: f64) -> bool {
    magnesium < HYPOMAGNESEMIA_MG
}

pub fn is_lung_protective(tidal_volume_per_kg: f64) -> bool {
    tidal_volume_per_kg <= PROTECTIVE_TIDAL_VOLUME_PER_KG
}

pub fn is_low_peep(peep: f64) -> bool {
    peep < MIN_PEEP
}

pub fn is_recruitment_hypoxemia(pa_o2: f64) -> bool {
    pa_o2 < RECRUITMENT_PAO2
}

pub fn is_toxic_fio2(fio2: f64) -> bool {
    fio2 > FIO2_TOXICITY
}

pub fn is_high_risk_fio2(fio2: f64) -> bool {
    fio2 > FIO2_HIGH_RISK
}

pub fn is_low_respiratory_rate(respiratory_rate: f64) -> bool {
    respiratory_rate < MIN_RESPIRATORY_RATE
}

/// Round half up, matching how the bedside values have always been displayed.
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub(crate) fn round_to_tenth(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

/// One decimal taken from the exact binary value, so 4.05 (stored as
/// 4.0499...) gives 4.0. Only exact ties (x.25, x.75) round up.
pub(crate) fn fixed_tenth(value: f64) -> f64 {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return round_half_up(value * 10.0) / 10.0;
    }
    format!("{value:.1}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ph_boundaries_are_strict() {
        assert!(!is_severe_acidemia(7.20));
        assert!(is_severe_acidemia(7.19));
        assert!(!is_acidemia(7.35));
        assert!(!is_alkalemia(7.45));
        assert!(is_alkalemia(7.46));
    }

    #[test]
    fn lab_boundaries_are_inclusive_where_expected() {
        assert!(is_hyperkalemia(6.0));
        assert!(!is_hyperkalemia(5.9));
        assert!(is_lactic_acidosis(4.0));
        assert!(is_severe_anemia(7.0));
        assert!(!is_hypocalcemia(8.5));
        assert!(!is_hypomagnesemia(1.8));
    }

    #[test]
    fn rounding_goes_half_up() {
        assert_eq!(round_half_up(34.5), 35.0);
        assert_eq!(round_half_up(119.4), 119.0);
        assert_eq!(round_to_tenth(5.714), 5.7);
        assert_eq!(round_to_tenth(7.142), 7.1);
    }

    #[test]
    fn fixed_tenth_uses_the_stored_value() {
        // 4.05 and 9.45 are stored just below the tie.
        assert_eq!(fixed_tenth(450.0 * 9.0 / 1000.0), 4.0);
        assert_eq!(fixed_tenth(450.0 * 21.0 / 1000.0), 9.4);
        assert_eq!(round_to_tenth(450.0 * 9.0 / 1000.0), 4.1);
        // Exact ties go up.
        assert_eq!(fixed_tenth(1.25), 1.3);
        assert_eq!(fixed_tenth(0.75), 0.8);
        assert_eq!(fixed_tenth(4.8), 4.8);
        assert_eq!(fixed_tenth(6.0), 6.0);
    }

    #[test]
    fn oxygenation_cut_off_is_strict() {
        assert!(is_critical_oxygenation(199.6));
        assert!(!is_critical_oxygenation(200.0));
        assert!(is_lung_protective(6.0));
        assert!(!is_lung_protective(423.0 / 70.0));
    }
}
