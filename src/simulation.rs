use serde::Serialize;

use crate::error::SimError;
use crate::incidence::IncidenceSummary;
use crate::model::params::Parameters;
use crate::model::rates::Rates;
use crate::model::sirs::{Scenario, SirsModel, SirsState};
use crate::model::trajectory::TimeGrid;

/// Vaccinated trajectory plus the aligned vaccination-free infectious series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub time: Vec<u32>,
    #[serde(rename = "S")]
    pub s: Vec<f64>,
    #[serde(rename = "I")]
    pub i: Vec<f64>,
    #[serde(rename = "R")]
    pub r: Vec<f64>,
    #[serde(rename = "baseline_I")]
    pub baseline_i: Vec<f64>,
    pub rates: Rates,
    pub incidence_summary: IncidenceSummary,
}

/// One aligned day of a [`SimulationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultRow {
    pub day: u32,
    #[serde(rename = "S")]
    pub s: f64,
    #[serde(rename = "I")]
    pub i: f64,
    #[serde(rename = "R")]
    pub r: f64,
    #[serde(rename = "baseline_I")]
    pub baseline_i: f64,
    pub new_cases: f64,
    pub baseline_new_cases: f64,
}

impl SimulationResult {
    pub fn rows(&self) -> impl Iterator<Item = ResultRow> + '_ {
        let inc = &self.incidence_summary;
        (0..self.time.len()).map(move |k| ResultRow {
            day: self.time[k],
            s: self.s[k],
            i: self.i[k],
            r: self.r[k],
            baseline_i: self.baseline_i[k],
            new_cases: inc.new_cases[k],
            baseline_new_cases: inc.baseline_new_cases[k],
        })
    }
}

/// Run the vaccinated and baseline scenarios for `params` on the default grid.
///
/// Both runs share the initial state, the grid and the step plan, so any
/// difference between the two infectious series comes from the vaccination
/// flow alone.
pub fn simulate(params: &Parameters) -> Result<SimulationResult, SimError> {
    let rates = Rates::from_params(params)?;
    let model = SirsModel::new(rates);
    let grid = TimeGrid::default();
    let initial = SirsState::from_slice(&params.initial_state());

    log::debug!(
        "rates beta={:.6} gamma={:.6} omega={:.6} nu={:.6}, {:?}",
        rates.beta,
        rates.gamma,
        rates.omega,
        rates.nu,
        model.step_plan()
    );

    let run = |scenario: Scenario| {
        model.simulate(scenario, initial, &grid).map_err(|e| {
            log::warn!("{} run aborted: {}", scenario, e);
            e
        })
    };
    let vaccinated = run(Scenario::Vaccinated)?;
    let baseline = run(Scenario::Baseline)?;

    let i = vaccinated.infectious();
    let baseline_i = baseline.infectious();
    let incidence_summary = IncidenceSummary::from_series(&i, &baseline_i);

    log::info!(
        "simulated {} days: incidence {:.1} vs baseline {:.1} per 100k ({:?})",
        grid.days(),
        incidence_summary.total_per_100k,
        incidence_summary.baseline_total_per_100k,
        incidence_summary.percent_reduction
    );

    Ok(SimulationResult {
        s: vaccinated.susceptible(),
        r: vaccinated.recovered(),
        time: vaccinated.time,
        i,
        baseline_i,
        rates,
        incidence_summary,
    })
}
