use std::io::Write;
use std::path::Path;

use super::repository::CashflowRow;

/// Writes rows as CSV with a header line; empty segment columns stay blank.
pub fn write_rows_csv<W: Write>(writer: W, rows: &[CashflowRow]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_rows_csv_path<P: AsRef<Path>>(path: P, rows: &[CashflowRow]) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_rows_csv(file, rows)
}
