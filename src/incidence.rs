//! New-case counts derived from prevalence series.
//!
//! New cases are first differences of the infectious proportion, floored at
//! zero, with day 0 compared against an implicit zero. This undercounts true
//! infections whenever recoveries and new infections overlap within a day.

use serde::Serialize;

/// Presentation unit for totals.
pub const PER_100K: f64 = 100_000.0;

/// Relative reduction of total incidence under vaccination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// Rounded percentage of baseline incidence avoided.
    Percent(u32),
    /// Baseline incidence is zero, so a relative reduction has no meaning.
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidenceSummary {
    pub new_cases: Vec<f64>,
    pub baseline_new_cases: Vec<f64>,
    pub total_per_100k: f64,
    pub baseline_total_per_100k: f64,
    pub cases_averted_per_100k: f64,
    pub percent_reduction: Reduction,
}

impl IncidenceSummary {
    pub fn from_series(infectious: &[f64], baseline_infectious: &[f64]) -> Self {
        let vaccinated = new_cases(infectious);
        let baseline = new_cases(baseline_infectious);
        let total_per_100k = vaccinated.iter().sum::<f64>() * PER_100K;
        let baseline_total_per_100k = baseline.iter().sum::<f64>() * PER_100K;

        Self {
            percent_reduction: percent_reduction(total_per_100k, baseline_total_per_100k),
            cases_averted_per_100k: baseline_total_per_100k - total_per_100k,
            new_cases: vaccinated,
            baseline_new_cases: baseline,
            total_per_100k,
            baseline_total_per_100k,
        }
    }
}

/// `max(0, I[k] - I[k-1])` per step, with `I[-1] = 0`.
pub fn new_cases(infectious: &[f64]) -> Vec<f64> {
    let mut prev = 0.0;
    infectious
        .iter()
        .map(|&i| {
            let d = (i - prev).max(0.0);
            prev = i;
            d
        })
        .collect()
}

pub fn percent_reduction(total: f64, baseline_total: f64) -> Reduction {
    if baseline_total == 0.0 {
        return Reduction::NotApplicable;
    }
    let pct = (100.0 * (baseline_total - total).abs() / baseline_total).round();
    Reduction::Percent(pct as u32)
}
