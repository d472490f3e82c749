use anyhow::Context;

use crate::simulation::SimulationResult;

/// Write one row per day: `day,S,I,R,baseline_I,new_cases,baseline_new_cases`.
pub fn write_result_csv<W: std::io::Write>(writer: W, result: &SimulationResult) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in result.rows() {
        wtr.serialize(row)
            .with_context(|| format!("Failed to write CSV row for day {}", row.day))?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn write_result_csv_file(path: impl AsRef<std::path::Path>, result: &SimulationResult) -> anyhow::Result<()> {
    let path = path.as_ref();
    let f = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_result_csv(f, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::params::Parameters;
    use crate::simulation::simulate;

    #[test]
    fn writes_header_and_one_row_per_day() {
        let res = simulate(&Parameters::default()).unwrap();
        let mut buf = Vec::new();
        write_result_csv(&mut buf, &res).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("day,S,I,R,baseline_I,new_cases,baseline_new_cases"));
        assert_eq!(lines.count(), 31);

        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        let first = rdr.records().next().unwrap().unwrap();
        assert_eq!(&first[0], "0");
        assert_eq!(first[2].parse::<f64>().unwrap(), 0.01);
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let res = simulate(&Parameters::default()).unwrap();
        write_result_csv_file(&path, &res).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("day,"));
    }
}
