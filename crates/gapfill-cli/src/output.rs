//! Writers for the completed series.

use gapfill_core::PipelineOutput;
use std::io::Write;

/// Write one `date,value,imputed` row per calendar date.
pub fn write_completed<W: Write>(writer: W, output: &PipelineOutput) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for day in output.completed() {
        csv.serialize(day)?;
    }
    csv.flush()?;
    Ok(())
}
