use anyhow::Context;

use crate::incidence::Reduction;
use crate::model::params::Parameters;
use crate::simulation::SimulationResult;

/// Write a plain-text log of one run to `<out_dir>/run_<run_id>.txt`.
///
/// Layout: `key=value` header with the inputs, a blank line, the daily table
/// and the incidence totals.
pub fn write_run_log(
    out_dir: impl AsRef<std::path::Path>,
    run_id: &str,
    params: &Parameters,
    result: &SimulationResult,
) -> anyhow::Result<std::path::PathBuf> {
    use std::io::Write;

    std::fs::create_dir_all(out_dir.as_ref()).context("create logs dir failed")?;
    let path = out_dir.as_ref().join(format!("run_{}.txt", run_id));
    let mut f = std::fs::File::create(&path)
        .with_context(|| format!("create run log file failed (path={:?})", path))?;

    let bands: Vec<&str> = params.targeted_age_bands.iter().map(|b| b.label()).collect();
    writeln!(f, "run_id={}", run_id)?;
    writeln!(f, "initial_prevalence={:.6}", params.initial_prevalence)?;
    writeln!(f, "transmission_probability={:.6}", params.transmission_probability)?;
    writeln!(f, "infection_duration_weeks={:.6}", params.infection_duration_weeks)?;
    writeln!(f, "waning_weeks={:.6}", params.waning_weeks)?;
    writeln!(f, "vaccination_uptake_weekly={:.6}", params.vaccination_uptake_weekly)?;
    writeln!(f, "targeted_age_bands={}", bands.join(";"))?;
    writeln!(f, "nu_per_day={:.6}", result.rates.nu)?;
    writeln!(f)?;
    writeln!(f, "day,S,I,R,baseline_I,new_cases,baseline_new_cases")?;

    let n = result.time.len();
    anyhow::ensure!(
        [result.s.len(), result.i.len(), result.r.len(), result.baseline_i.len()].iter().all(|&len| len == n),
        "series length mismatch"
    );
    for row in result.rows() {
        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            row.day, row.s, row.i, row.r, row.baseline_i, row.new_cases, row.baseline_new_cases
        )?;
    }

    let inc = &result.incidence_summary;
    writeln!(f)?;
    writeln!(f, "total_per_100k={:.1}", inc.total_per_100k)?;
    writeln!(f, "baseline_total_per_100k={:.1}", inc.baseline_total_per_100k)?;
    match inc.percent_reduction {
        Reduction::Percent(p) => writeln!(f, "percent_reduction={}", p)?,
        Reduction::NotApplicable => writeln!(f, "percent_reduction=NA")?,
    }

    Ok(path)
}
