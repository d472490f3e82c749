pub mod params;
pub mod rates;
pub mod sirs;
pub mod trajectory;
