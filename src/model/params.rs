use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum AgeBand {
    None,
    Youth,
    Adults,
    OlderAdults,
}

/// Population share of each age band. `None` selects nobody.
///
/// Shares of the three real bands sum to 1.0.
pub const AGE_BAND_WEIGHTS: [(AgeBand, f64); 4] = [
    (AgeBand::None, 0.0),
    (AgeBand::Youth, 0.221),
    (AgeBand::Adults, 0.614),
    (AgeBand::OlderAdults, 0.165),
];

impl AgeBand {
    pub fn weight(self) -> f64 {
        AGE_BAND_WEIGHTS
            .iter()
            .find(|(band, _)| *band == self)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBand::None => "None",
            AgeBand::Youth => "Youth",
            AgeBand::Adults => "Adults",
            AgeBand::OlderAdults => "OlderAdults",
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeBand {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "None" | "none" => Ok(AgeBand::None),
            "Youth" | "youth" => Ok(AgeBand::Youth),
            "Adults" | "adults" => Ok(AgeBand::Adults),
            "OlderAdults" | "Older-adults" | "older_adults" => Ok(AgeBand::OlderAdults),
            other => Err(SimError::invalid(
                "targeted_age_bands",
                format!("unknown age band '{}'", other),
            )),
        }
    }
}

impl TryFrom<String> for AgeBand {
    type Error = SimError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// User-facing inputs of one simulation run.
///
/// Durations are in weeks, uptake is a weekly proportion. Conversion to
/// per-day rates happens in [`crate::model::rates::Rates::from_params`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub initial_prevalence: f64,
    pub transmission_probability: f64,
    pub infection_duration_weeks: f64,
    pub waning_weeks: f64,
    pub vaccination_uptake_weekly: f64,
    pub targeted_age_bands: BTreeSet<AgeBand>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            initial_prevalence: 0.01,
            transmission_probability: 0.01,
            infection_duration_weeks: 1.0,
            waning_weeks: 2.0,
            vaccination_uptake_weekly: 0.0,
            targeted_age_bands: BTreeSet::new(),
        }
    }
}

impl Parameters {
    pub fn check(&self) -> Result<(), SimError> {
        // NaN fails every comparison below
        let p = self.initial_prevalence;
        if !(p > 0.0 && p <= 1.0) {
            return Err(SimError::invalid("initial_prevalence", format!("{} not in (0, 1]", p)));
        }
        let beta = self.transmission_probability;
        if !(0.0..=1.0).contains(&beta) {
            return Err(SimError::invalid("transmission_probability", format!("{} not in [0, 1]", beta)));
        }
        let v = self.vaccination_uptake_weekly;
        if !(0.0..=1.0).contains(&v) {
            return Err(SimError::invalid("vaccination_uptake_weekly", format!("{} not in [0, 1]", v)));
        }
        for (name, weeks) in [
            ("infection_duration_weeks", self.infection_duration_weeks),
            ("waning_weeks", self.waning_weeks),
        ] {
            if !(weeks > 0.0 && weeks.is_finite()) {
                return Err(SimError::invalid(name, format!("{} must be a finite duration > 0", weeks)));
            }
        }
        Ok(())
    }

    /// Initial (S, I, R) proportions.
    pub fn initial_state(&self) -> [f64; 3] {
        [1.0 - self.initial_prevalence, self.initial_prevalence, 0.0]
    }
}
