//! Market data files and the trade ledger.

mod csv_source;
mod ledger;

pub use csv_source::CsvDataSource;
pub use ledger::{CsvTradeLedger, LEDGER_HEADER};

use std::path::Path;
use trading_core::error::DataError;
use trading_core::types::PriceBar;

/// Load bars from a CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<PriceBar>, DataError> {
    CsvDataSource::new(path)?.load_all()
}
