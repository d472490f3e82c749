pub mod debug_log;
pub mod params_json;
pub mod result_csv;
