pub mod error;
pub mod math;
pub mod model;
pub mod io;
pub mod incidence;
pub mod simulation;

pub use error::SimError;
pub use incidence::{IncidenceSummary, Reduction};
pub use model::params::{AgeBand, Parameters};
pub use simulation::{simulate, SimulationResult};
