use crate::domain::stock::GasType;
use crate::domain::transaction::PaymentMethod;
use crate::error::{DepotError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Stockin,
    Order,
    Pay,
    Webhook,
}

/// One row of a replay script.
///
/// Columns are `op, tag, branch, gas_type, quantity, amount, method,
/// status`; which of them must be filled depends on the op. `tag` is a
/// script-chosen handle that later rows use to refer back to an order.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OpRecord {
    pub op: OpKind,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub gas_type: Option<GasType>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Reads replay operations from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record
/// lengths, yielding an iterator of `Result<OpRecord>` so a malformed row
/// fails alone instead of aborting the run.
pub struct OpsReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OpsReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn records(self) -> impl Iterator<Item = Result<OpRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(DepotError::from))
    }
}
