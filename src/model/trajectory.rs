use crate::model::sirs::SirsState;

/// Number of days simulated after day 0.
pub const HORIZON_DAYS: u32 = 30;

/// Integer-day sampling grid `0..=days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    days: u32,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self { days: HORIZON_DAYS }
    }
}

impl TimeGrid {
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Number of sample points, including day 0.
    pub fn len(&self) -> usize {
        self.days as usize + 1
    }

    pub fn points(&self) -> impl Iterator<Item = u32> {
        0..=self.days
    }
}

/// States sampled on a [`TimeGrid`], first entry is the initial state.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub time: Vec<u32>,
    pub states: Vec<SirsState>,
}

impl Trajectory {
    pub fn susceptible(&self) -> Vec<f64> {
        self.states.iter().map(|x| x.s).collect()
    }

    pub fn infectious(&self) -> Vec<f64> {
        self.states.iter().map(|x| x.i).collect()
    }

    pub fn recovered(&self) -> Vec<f64> {
        self.states.iter().map(|x| x.r).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_has_31_daily_points() {
        let g = TimeGrid::default();
        assert_eq!(g.len(), 31);
        let pts: Vec<u32> = g.points().collect();
        assert_eq!(pts.first(), Some(&0));
        assert_eq!(pts.last(), Some(&30));
        assert_eq!(pts.len(), g.len());
    }
}
