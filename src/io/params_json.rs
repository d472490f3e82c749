use anyhow::Context;

use crate::model::params::Parameters;

/// Load run parameters from a JSON file. Missing fields take their defaults.
pub fn load_parameters_json(path: impl AsRef<std::path::Path>) -> anyhow::Result<Parameters> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file: {}", path.display()))?;
    let params: Parameters = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse parameter file: {}", path.display()))?;
    params.check().context("parameter file out of range")?;
    Ok(params)
}
