use std::fmt;

use crate::error::SimError;
use crate::math::ode::{integrate, plan_for, StepPlan};
use crate::model::rates::Rates;
use crate::model::trajectory::{TimeGrid, Trajectory};

/// Absolute tolerance on `S + I + R = 1`.
pub const CONSERVATION_TOL: f64 = 1e-6;

/// Which flows are active in the right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Includes the S->R vaccination flow.
    Vaccinated,
    /// No vaccination flow at all.
    Baseline,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Vaccinated => f.write_str("vaccinated"),
            Scenario::Baseline => f.write_str("baseline"),
        }
    }
}

/// Population proportions in each compartment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirsState {
    pub s: f64,
    pub i: f64,
    pub r: f64,
}

impl SirsState {
    pub fn from_slice(y: &[f64]) -> Self {
        Self { s: y[0], i: y[1], r: y[2] }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.s, self.i, self.r]
    }

    pub fn total(&self) -> f64 {
        self.s + self.i + self.r
    }
}

pub struct SirsModel {
    pub rates: Rates,
}

impl SirsModel {
    pub fn new(rates: Rates) -> Self {
        Self { rates }
    }

    /// Step plan shared by both scenarios of a run.
    pub fn step_plan(&self) -> StepPlan {
        plan_for(self.rates.total())
    }

    pub fn deriv(&self, scenario: Scenario, y: &[f64], dy: &mut [f64]) {
        let Rates { beta, gamma, omega, nu } = self.rates;
        let (s, i, r) = (y[0], y[1], y[2]);

        let infection = beta * s * i;
        let recovery = gamma * i;
        let waning = omega * r;
        let vaccination = match scenario {
            Scenario::Vaccinated => nu * s,
            Scenario::Baseline => 0.0,
        };

        dy[0] = -infection - vaccination + waning;
        dy[1] = infection - recovery;
        dy[2] = recovery + vaccination - waning;
    }

    /// Row-major Jacobian of [`Self::deriv`] with respect to (S, I, R).
    pub fn jacobian(&self, scenario: Scenario, y: &[f64], jac: &mut [f64]) {
        let Rates { beta, gamma, omega, nu } = self.rates;
        let (s, i) = (y[0], y[1]);
        let nu = match scenario {
            Scenario::Vaccinated => nu,
            Scenario::Baseline => 0.0,
        };

        jac.copy_from_slice(&[
            -beta * i - nu, -beta * s, omega,
            beta * i, beta * s - gamma, 0.0,
            nu, gamma, -omega,
        ]);
    }

    /// Integrate one scenario over `grid`, starting from `initial`.
    pub fn simulate(&self, scenario: Scenario, initial: SirsState, grid: &TimeGrid) -> Result<Trajectory, SimError> {
        let rows = integrate(
            &initial.as_array(),
            grid,
            self.step_plan(),
            |_t, y, dy| self.deriv(scenario, y, dy),
            |_t, y, jac| self.jacobian(scenario, y, jac),
        )?;

        let mut states = Vec::with_capacity(rows.len());
        for (day, y) in grid.points().zip(&rows) {
            let state = SirsState::from_slice(y);
            let drift = (state.total() - 1.0).abs();
            if drift >= CONSERVATION_TOL {
                return Err(SimError::unstable(
                    day,
                    format!("{} run: S+I+R drifted by {:e}", scenario, drift),
                ));
            }
            states.push(state);
        }

        Ok(Trajectory { time: grid.points().collect(), states })
    }
}
