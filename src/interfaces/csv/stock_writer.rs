use crate::domain::stock::GasType;
use crate::error::Result;
use std::io::Write;

/// Writes the final stock ledger as CSV.
pub struct StockWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StockWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().from_writer(sink),
        }
    }

    pub fn write_levels(&mut self, rows: Vec<(String, GasType, u32)>) -> Result<()> {
        self.writer.write_record(["branch", "gas_type", "quantity"])?;
        for (branch, gas_type, quantity) in rows {
            self.writer
                .write_record([branch, gas_type.to_string(), quantity.to_string()])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
