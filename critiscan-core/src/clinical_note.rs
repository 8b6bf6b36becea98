use std::fmt::Write;

use crate::interpretation::Interpretation;
use crate::models::TreatmentAction;
use crate::treatment::PlanOutcome;

pub const DISCLAIMER: &str =
    "For clinical decision support only. Always verify with clinical judgment.";

/// Plain-text summary for EHR documentation and team handoffs.
pub fn render_clinical_note(interpretation: &Interpretation) -> String {
    let mut note = String::new();
    // Writing to a String cannot fail.
    let _ = write_note(&mut note, interpretation);
    note
}

fn write_note(out: &mut String, interpretation: &Interpretation) -> std::fmt::Result {
    writeln!(out, "ICU CLINICAL SUMMARY")?;
    writeln!(out, "Critical findings: {}", interpretation.critical_findings)?;

    if let Some(acid_base) = &interpretation.acid_base {
        writeln!(out)?;
        writeln!(out, "ABG INTERPRETATION")?;
        if let Some(banner) = &acid_base.critical_banner {
            writeln!(out, "!! {}", banner)?;
        }
        writeln!(out, "pH {} ({})", acid_base.ph, acid_base.ph_label)?;
        writeln!(out, "Primary: {}", acid_base.primary_label)?;
        writeln!(
            out,
            "Compensation: expected PaCO₂ {} ({:?})",
            acid_base.compensation.range_label, acid_base.compensation.status
        )?;
        if let Some(gap) = &acid_base.anion_gap {
            writeln!(out, "Anion gap {}: {}", gap.value, gap.note)?;
        }
    }

    if let Some(oxygenation) = &interpretation.oxygenation {
        writeln!(out, "P/F ratio {} ({})", oxygenation.pf_ratio, oxygenation.label)?;
    }

    if let Some(ventilator) = &interpretation.ventilator {
        writeln!(out)?;
        writeln!(out, "VENTILATOR")?;
        for warning in &ventilator.warnings {
            writeln!(out, "!! {}", warning)?;
        }
        writeln!(
            out,
            "Mode {}, {} mL/kg IBW ({} kg), minute ventilation {:.1} L/min",
            ventilator.mode,
            ventilator.tidal_volume_per_kg,
            ventilator.ideal_body_weight_kg,
            ventilator.minute_ventilation
        )?;
        for recommendation in &ventilator.recommendations {
            writeln!(out, "- {} ({})", recommendation.message, recommendation.reason)?;
        }
    }

    if let Some(labs) = &interpretation.labs {
        writeln!(out)?;
        writeln!(out, "LABS")?;
        if let Some(banner) = &labs.critical_banner {
            writeln!(out, "!! {}", banner)?;
        }
        for result in &labs.results {
            writeln!(
                out,
                "{}: {} {} ({:?})",
                result.name, result.value, result.unit, result.status
            )?;
        }
        for alert in &labs.alerts {
            writeln!(out, "- {}: {}", alert.message, alert.treatment)?;
        }
    }

    writeln!(out)?;
    match &interpretation.treatment_plan {
        PlanOutcome::AwaitingData { message } => writeln!(out, "{}", message)?,
        PlanOutcome::Ready { plan, .. } => {
            write_bucket(out, "IMMEDIATE ACTIONS", &plan.immediate)?;
            write_bucket(out, "VENTILATOR ADJUSTMENTS", &plan.ventilator)?;
            write_bucket(out, "MEDICATION ORDERS", &plan.medications)?;
            write_bucket(out, "FOLLOW-UP & MONITORING", &plan.monitoring)?;
        }
    }

    writeln!(out)?;
    write!(out, "{}", DISCLAIMER)
}

fn write_bucket(out: &mut String, title: &str, actions: &[TreatmentAction]) -> std::fmt::Result {
    if actions.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", title)?;
    for action in actions {
        writeln!(
            out,
            "- [{}] {}: {}",
            action.timeframe, action.action, action.detail
        )?;
    }
    Ok(())
}
