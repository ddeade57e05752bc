//! CSV trade ledger.
//!
//! The file layout is read by external tooling and must not change:
//! header `Symbol,Time,Signal,Price,TP,SL,Type`, UTC times formatted as
//! `YYYY-MM-DD HH:MM:SS.ffffff`, signal as `1`/`-1`, type as `BUY`/`SELL`.

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, WriterBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use trading_core::error::LedgerError;
use trading_core::traits::TradeLedger;
use trading_core::types::{Side, Signal, TradeRecord};

/// Header row of the trade log.
pub const LEDGER_HEADER: &str = "Symbol,Time,Signal,Price,TP,SL,Type";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Signal")]
    signal: i8,
    #[serde(rename = "Price")]
    price: Decimal,
    #[serde(rename = "TP")]
    take_profit: Decimal,
    #[serde(rename = "SL")]
    stop_loss: Decimal,
    #[serde(rename = "Type")]
    side: String,
}

impl From<&TradeRecord> for LedgerRow {
    fn from(record: &TradeRecord) -> Self {
        Self {
            symbol: record.symbol.clone(),
            time: record.timestamp.format(TIME_FORMAT).to_string(),
            signal: record.signal.code(),
            price: record.executed_price,
            take_profit: record.take_profit,
            stop_loss: record.stop_loss,
            side: record.side.to_string(),
        }
    }
}

impl LedgerRow {
    fn into_record(self, row: usize) -> Result<TradeRecord, LedgerError> {
        let malformed = |reason: String| LedgerError::Malformed { row, reason };

        let timestamp = NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%d %H:%M:%S%.f")
            .map_err(|e| malformed(format!("time {:?}: {}", self.time, e)))?
            .and_utc();
        let signal = Signal::from_code(self.signal)
            .ok_or_else(|| malformed(format!("signal code {}", self.signal)))?;
        let side = self.side.parse::<Side>().map_err(malformed)?;

        Ok(TradeRecord {
            symbol: self.symbol,
            timestamp,
            signal,
            executed_price: self.price,
            take_profit: self.take_profit,
            stop_loss: self.stop_loss,
            side,
        })
    }
}

/// Append-only CSV trade log.
///
/// Appends from one process are serialized by an internal lock; each
/// append is a single `write_all` of one complete line.
#[derive(Debug)]
pub struct CsvTradeLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvTradeLedger {
    /// Create a ledger at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the ledger path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back, oldest first. A missing file is empty.
    pub fn records(&self) -> Result<Vec<TradeRecord>, LedgerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| LedgerError::Csv(e.to_string()))?;

        reader
            .deserialize::<LedgerRow>()
            .enumerate()
            .map(|(i, row)| {
                let row = row.map_err(|e| LedgerError::Malformed {
                    row: i + 1,
                    reason: e.to_string(),
                })?;
                row.into_record(i + 1)
            })
            .collect()
    }

    fn encode(record: &TradeRecord, with_header: bool) -> Result<Vec<u8>, LedgerError> {
        let mut writer = WriterBuilder::new()
            .has_headers(with_header)
            .from_writer(Vec::new());
        writer
            .serialize(LedgerRow::from(record))
            .map_err(|e| LedgerError::Csv(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| LedgerError::Csv(e.to_string()))
    }
}

impl TradeLedger for CsvTradeLedger {
    fn append(&self, record: &TradeRecord) -> Result<(), LedgerError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| LedgerError::Csv("ledger lock poisoned".into()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let with_header = file.metadata()?.len() == 0;

        let line = Self::encode(record, with_header)?;
        file.write_all(&line)?;
        file.sync_data()?;

        debug!(
            "Ledger append: {} {} @ {} -> {}",
            record.side,
            record.symbol,
            record.executed_price,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn record(side: Side) -> TradeRecord {
        TradeRecord {
            symbol: "EURUSDm".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
            signal: if side == Side::Buy { Signal::Long } else { Signal::Short },
            executed_price: dec!(1.08520),
            take_profit: dec!(1.08720),
            stop_loss: dec!(1.08420),
            side,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CsvTradeLedger::new(dir.path().join("trade_log.csv"));

        ledger.append(&record(Side::Buy)).unwrap();
        ledger.append(&record(Side::Sell)).unwrap();

        let contents = fs::read_to_string(ledger.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LEDGER_HEADER);
        assert_eq!(
            lines[1],
            "EURUSDm,2024-03-05 14:30:00.000000,1,1.08520,1.08720,1.08420,BUY"
        );
        assert!(lines[2].ends_with(",-1,1.08520,1.08720,1.08420,SELL"));
    }

    #[test]
    fn test_header_added_to_empty_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trade_log.csv");
        fs::write(&path, "").unwrap();

        let ledger = CsvTradeLedger::new(&path);
        ledger.append(&record(Side::Buy)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(LEDGER_HEADER));
    }

    #[test]
    fn test_records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CsvTradeLedger::new(dir.path().join("nested").join("trade_log.csv"));
        assert!(ledger.records().unwrap().is_empty());

        let buy = record(Side::Buy);
        ledger.append(&buy).unwrap();

        let records = ledger.records().unwrap();
        assert_eq!(records, vec![buy]);
    }

    #[test]
    fn test_sub_microsecond_execution_time_round_trips() {
        use trading_core::types::{OrderMetadata, OrderRequest, OrderResult};

        let dir = tempfile::tempdir().unwrap();
        let ledger = CsvTradeLedger::new(dir.path().join("trade_log.csv"));
        let order = OrderRequest {
            symbol: "EURUSDm".to_string(),
            side: Side::Buy,
            volume: dec!(0.01),
            reference_price: dec!(1.08520),
            stop_loss: dec!(1.08420),
            take_profit: dec!(1.08720),
            metadata: OrderMetadata {
                deviation: 20,
                magic: 123456,
                comment: "sma-bot-trade".to_string(),
            },
        };
        let executed_at = Utc.timestamp_opt(1_709_649_000, 495_811_073).unwrap();
        let record = TradeRecord::from_execution(
            &order,
            &OrderResult::accepted(10009, dec!(1.08520)),
            Signal::Long,
            executed_at,
        )
        .unwrap();

        ledger.append(&record).unwrap();

        let contents = fs::read_to_string(ledger.path()).unwrap();
        assert!(contents.contains(",2024-03-05 14:30:00.495811,"));
        assert_eq!(ledger.records().unwrap(), vec![record]);
    }

    #[test]
    fn test_malformed_row_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trade_log.csv");
        fs::write(
            &path,
            format!("{}\nEURUSDm,not a time,1,1.1,1.2,1.0,BUY\n", LEDGER_HEADER),
        )
        .unwrap();

        let err = CsvTradeLedger::new(&path).records().unwrap_err();
        assert!(matches!(err, LedgerError::Malformed { row: 1, .. }));
    }
}
