//! Terminal output formatting with colors.

use colored::Colorize;
use vowelspace_core::aggregate::GroupKey;
use vowelspace_core::Measure;

use crate::descriptive::{DescriptiveReport, PairedComparison};
use crate::report::{AnalysisReport, ModelReport};

/// Format a full report for human-readable terminal output.
pub fn format_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let sep = "\u{2500}".repeat(62);

    out.push_str(&format!("\n  {}\n", "Vowel-space dispersion analysis".bold()));
    out.push_str(&format!("  Input: {}\n\n", report.input.display()));

    let c = &report.cleaning;
    out.push_str(&format!(
        "    Tokens:       {} monophthongs ({} diphthongs removed, {} rows with missing cells)\n",
        c.tokens, c.dropped_diphthongs, c.dropped_missing
    ));
    out.push_str(&format!(
        "    Speakers:     {}   Items: {}\n",
        report.descriptive.n_speakers,
        c.items.len()
    ));

    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&format_descriptive(&report.descriptive));

    if !report.models.is_empty() || !report.model_failures.is_empty() {
        out.push('\n');
        out.push_str(&sep);
        out.push_str("\n\n  Models\n");
        for model in &report.models {
            out.push_str(&format_model(model));
        }
        for failure in &report.model_failures {
            out.push_str(&format!(
                "\n    {} {}: {}\n",
                "\u{2717}".red(),
                failure.name.bold(),
                failure.error
            ));
        }
    }

    if !report.tables.is_empty() {
        out.push('\n');
        out.push_str(&sep);
        out.push_str("\n\n  Tables\n");
        for path in &report.tables {
            out.push_str(&format!("    {}\n", path.display()));
        }
    }

    out
}

/// Condition means, paired tests and vowel-space areas.
pub fn format_descriptive(desc: &DescriptiveReport) -> String {
    let mut out = String::from("\n  Descriptive statistics\n\n");

    for measure in [Measure::Duration, Measure::EuclideanDist, Measure::BothDist] {
        if let Some(table) = desc.summary(measure, &[GroupKey::Condition]) {
            let cells: Vec<String> = table
                .rows
                .iter()
                .map(|r| {
                    let sd = r
                        .sd
                        .map(|s| format!("{:.1}", s))
                        .unwrap_or_else(|| "NA".to_string());
                    format!("{} {:.1} (sd {}, n {})", r.labels.join(" "), r.mean, sd, r.n)
                })
                .collect();
            out.push_str(&format!("    {:<15}{}\n", measure.column(), cells.join("   ")));
        }
    }

    out.push_str("\n  Polite \u{2212} casual (per-speaker means)\n\n");
    for comparison in &desc.comparisons {
        out.push_str(&format_comparison(comparison));
    }

    if !desc.vowel_spaces.is_empty() {
        out.push_str("\n  Vowel-space area (Hz\u{b2})\n\n");
        for space in &desc.vowel_spaces {
            out.push_str(&format!(
                "    {:<8}{:<3}{:>12.0}  ({} vertices)\n",
                space.condition.as_str(),
                space.gender.as_str(),
                space.area,
                space.hull.len()
            ));
        }
    }
    out
}

fn format_comparison(comparison: &PairedComparison) -> String {
    let name = comparison.measure.column();
    match &comparison.test {
        Ok(t) => {
            let p = format!("p = {:.4}", t.p_value);
            let p = if t.p_value < 0.05 {
                p.green().to_string()
            } else {
                p.normal().to_string()
            };
            let excluded = if t.excluded > 0 {
                format!(" ({} excluded)", t.excluded).yellow().to_string()
            } else {
                String::new()
            };
            format!(
                "    {:<15}mean {:+.2}, t({}) = {:.2}, {}, n = {}{}\n",
                name, t.mean, t.df, t.t, p, t.n, excluded
            )
        }
        Err(reason) => format!("    {:<15}{}\n", name, reason.yellow()),
    }
}

/// One model: convergence status and key effects.
pub fn format_model(model: &ModelReport) -> String {
    let mut out = String::new();
    let status = if model.converged() {
        "\u{2713}".green()
    } else {
        "\u{26A0}".yellow()
    };
    out.push_str(&format!("\n    {} {}\n", status, model.name.bold()));
    out.push_str(&format!("      {}\n", model.formula.dimmed()));
    out.push_str(&format!(
        "      {} chains \u{d7} {} draws, {} attempt(s), n = {}\n",
        model.control.chains,
        model.control.draws_per_chain(),
        model.attempts,
        model.n_obs
    ));

    for effect in &model.key_effects {
        let ci = model
            .coefficients
            .iter()
            .find(|c| c.name == effect.name)
            .map(|c| format!("[{:.3}, {:.3}]", c.lower, c.upper))
            .unwrap_or_default();
        out.push_str(&format!(
            "      {:<20}{:>10.3} {:<22} P(>0) = {:.3}\n",
            effect.name, effect.mean, ci, effect.prob_positive
        ));
    }

    if let Some(err) = &model.convergence {
        out.push_str(&format!("      {} {}\n", "Not converged:".red().bold(), err.issues.join("; ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptive::TTestResult;

    #[test]
    fn test_comparison_lines() {
        colored::control::set_override(false);
        let ok = PairedComparison {
            measure: Measure::EuclideanDist,
            differences: Vec::new(),
            test: Ok(TTestResult {
                n: 10,
                excluded: 2,
                mean: 12.5,
                sd: 4.0,
                t: 9.88,
                df: 9.0,
                p_value: 0.00001,
            }),
        };
        let line = format_comparison(&ok);
        assert!(line.contains("euclidean_dist"));
        assert!(line.contains("(2 excluded)"));
        assert!(line.contains("n = 10"));

        let skipped = PairedComparison {
            test: Err("missing value: too few".into()),
            ..ok
        };
        assert!(format_comparison(&skipped).contains("too few"));
    }
}
