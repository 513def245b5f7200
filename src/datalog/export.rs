//! Log export
//!
//! Writes a recorded session out as delimited text and reads it back.
//! The format is a two-column CSV matching what downstream analysis tools
//! expect from the recorder.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::Sample;

/// Header row written at the top of every exported log
pub const CSV_HEADER: &str = "Time (s),Voltage (mV)";

/// Write samples to a CSV file at `path`
pub fn write_csv<P: AsRef<Path>>(path: P, samples: &[Sample]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_csv_to(&mut writer, samples)?;
    writer.flush()
}

/// Write samples as CSV rows to any sink, in snapshot order.
///
/// Values use plain float formatting so a re-parse reproduces them exactly.
pub fn write_csv_to<W: Write>(writer: &mut W, samples: &[Sample]) -> io::Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for sample in samples {
        writeln!(writer, "{},{}", sample.elapsed_secs, sample.value)?;
    }
    Ok(())
}

/// Read a previously exported log back into samples.
///
/// The header row and any rows that do not parse are skipped.
pub fn read_csv<P: AsRef<Path>>(path: P) -> io::Result<Vec<Sample>> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let mut fields = line.splitn(2, ',');
        if let (Some(t), Some(v)) = (fields.next(), fields.next()) {
            if let (Ok(t), Ok(v)) = (t.trim().parse(), v.trim().parse()) {
                samples.push(Sample::new(t, v));
            }
        }
    }

    Ok(samples)
}

/// Default timestamped file name for a saved recording,
/// e.g. `ekg_20260828_143000.csv`
pub fn default_log_name() -> String {
    format!("ekg_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_layout() {
        let samples = vec![Sample::new(0.0, 0.12), Sample::new(0.5, -0.35)];
        let mut out = Vec::new();
        write_csv_to(&mut out, &samples).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Time (s),Voltage (mV)\n0,0.12\n0.5,-0.35\n");
    }

    #[test]
    fn test_round_trip() {
        let samples = vec![
            Sample::new(0.0, 0.123456789),
            Sample::new(0.016, 1.0),
            Sample::new(7.25, -2.5e-3),
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.csv");
        write_csv(&path, &samples).unwrap();

        let restored = read_csv(&path).unwrap();
        assert_eq!(restored, samples);
    }

    #[test]
    fn test_read_skips_header_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dirty.csv");
        std::fs::write(
            &path,
            "Time (s),Voltage (mV)\n0.1,1.5\nnot,a number\nno-comma\n0.2,2.5\n",
        )
        .unwrap();

        let samples = read_csv(&path).unwrap();
        assert_eq!(samples, vec![Sample::new(0.1, 1.5), Sample::new(0.2, 2.5)]);
    }

    #[test]
    fn test_default_log_name_shape() {
        let name = default_log_name();
        assert!(name.starts_with("ekg_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "ekg_20260828_143000.csv".len());
    }
}
