use serde::Serialize;

use crate::error::SimError;
use crate::model::params::{AgeBand, Parameters};

const DAYS_PER_WEEK: f64 = 7.0;

/// Per-day rates driving the SIRS right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rates {
    pub beta: f64,  // transmission coefficient
    pub gamma: f64, // 1/infectious mean
    pub omega: f64, // waning from R->S
    pub nu: f64,    // vaccination S->R
}

impl Rates {
    pub fn from_params(p: &Parameters) -> Result<Self, SimError> {
        p.check()?;
        let vax_proportion = vaccination_coverage(p.targeted_age_bands.iter().copied());
        let gamma = 1.0 / (p.infection_duration_weeks * DAYS_PER_WEEK);
        let omega = 1.0 / (p.waning_weeks * DAYS_PER_WEEK);
        // durations below ~1e-308 days overflow the reciprocal
        for (name, rate) in [("infection_duration_weeks", gamma), ("waning_weeks", omega)] {
            if !rate.is_finite() {
                return Err(SimError::invalid(name, "duration too short to express as a daily rate"));
            }
        }
        Ok(Self {
            beta: p.transmission_probability,
            gamma,
            omega,
            nu: (p.vaccination_uptake_weekly / DAYS_PER_WEEK) * vax_proportion,
        })
    }

    /// Sum of all rate constants, used to size integration substeps.
    pub fn total(&self) -> f64 {
        self.beta + self.gamma + self.omega + self.nu
    }
}

/// Share of the population covered by the targeted age bands.
///
/// Additive over bands, capped at 1.0.
pub fn vaccination_coverage<I>(bands: I) -> f64
where
    I: IntoIterator<Item = AgeBand>,
{
    let sum: f64 = bands.into_iter().map(AgeBand::weight).sum();
    sum.min(1.0)
}
