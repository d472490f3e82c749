use anyhow::Context;

use vaxsim::io::params_json::load_parameters_json;
use vaxsim::io::result_csv::write_result_csv_file;
use vaxsim::{simulate, Parameters, Reduction};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // usage: vaxsim [params.json] [out.csv]
    let mut args = std::env::args().skip(1);
    let params = match args.next() {
        Some(path) => load_parameters_json(&path)?,
        None => Parameters::default(),
    };
    let out_csv = args.next();

    let result = simulate(&params).context("simulation failed")?;

    println!("day,S,I,R,baseline_I");
    for row in result.rows() {
        println!("{},{:.6},{:.6},{:.6},{:.6}", row.day, row.s, row.i, row.r, row.baseline_i);
    }

    let inc = &result.incidence_summary;
    println!();
    println!("incidence_per_100k={:.1}", inc.total_per_100k);
    println!("baseline_incidence_per_100k={:.1}", inc.baseline_total_per_100k);
    match inc.percent_reduction {
        Reduction::Percent(p) => println!("percent_reduction={}", p),
        Reduction::NotApplicable => println!("percent_reduction=NA"),
    }

    if let Some(path) = out_csv {
        write_result_csv_file(&path, &result)?;
        log::info!("wrote {}", path);
    }
    Ok(())
}
