//! Append-only prediction log and history reader.
//!
//! The log is a CSV file with a fixed eleven-column header. Appends from
//! this process go through a single writer lock, so concurrent checks never
//! interleave rows. Torn rows from other writers are skipped on read.

use crate::types::record::{LogRecord, LOG_HEADER};
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Prediction log backed by a CSV file
pub struct PredictionLog {
    path: PathBuf,
    writer: Mutex<()>,
}

impl PredictionLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header first if the file is absent or
    /// empty.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let _guard = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Log writer lock poisoned: {}", e))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        // An empty file can be left behind by a failed first write
        let needs_header = file
            .metadata()
            .with_context(|| format!("Failed to stat {}", self.path.display()))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        if needs_header {
            writer.write_record(LOG_HEADER)?;
            info!(path = %self.path.display(), "Started prediction log");
        }
        writer.serialize(record)?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!(path = %self.path.display(), result = %record.result, "Appended prediction");
        Ok(())
    }

    /// Read every record, most recent first.
    ///
    /// Returns `None` when no log exists yet or the file is empty. Rows that
    /// do not parse are skipped with a warning.
    pub fn load(&self) -> Result<Option<Vec<LogRecord>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", self.path.display()))
            }
        };
        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat {}", self.path.display()))?
            .len();
        if len == 0 {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for result in reader.deserialize::<LogRecord>() {
            match result {
                Ok(record) => records.push(record),
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    return Err(e).with_context(|| format!("Failed to read {}", self.path.display()));
                }
                Err(e) => {
                    let line = e.position().map(|p| p.line());
                    warn!(path = %self.path.display(), ?line, error = %e, "Skipping malformed log row");
                }
            }
        }

        sort_most_recent_first(&mut records);
        Ok(Some(records))
    }
}

/// Sort by parsed timestamp descending. Rows whose timestamp does not parse
/// go last. The sort is stable, so equal timestamps keep file order.
pub fn sort_most_recent_first(records: &mut [LogRecord]) {
    records.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.datetime.cmp(&a.datetime),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gender, TransactionInput, Verdict};
    use std::sync::Arc;
    use std::thread;

    fn record(datetime: &str, merchant: &str, verdict: Verdict) -> LogRecord {
        let tx = TransactionInput::new(merchant, "grocery", "4111111111111111");
        let mut record = LogRecord::now(&tx, 12.5, verdict);
        record.datetime = datetime.to_string();
        record
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_missing_log_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("fraud_predictions_log.csv"));
        assert_eq!(log.load().unwrap(), None);
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let log = PredictionLog::new(&path);

        log.append(&record("2024-03-05 14:30:00.000000", "ShopCo", Verdict::Legitimate))
            .unwrap();
        log.append(&record("2024-03-05 14:31:00.000000", "Acme", Verdict::Fraudulent))
            .unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "datetime,merchant,category,amt,distance,hour,day,month,gender,cc_num,result"
        );
        assert_eq!(
            lines[1],
            "2024-03-05 14:30:00.000000,ShopCo,grocery,0.0,12.5,12,15,6,Male,4111111111111111,Legitimate Transaction"
        );
    }

    #[test]
    fn test_empty_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "").unwrap();
        let log = PredictionLog::new(&path);
        assert_eq!(log.load().unwrap(), None);

        log.append(&record("2024-03-05 14:30:00.000000+00:00", "ShopCo", Verdict::Legitimate))
            .unwrap();
        log.append(&record("2024-03-05 14:31:00.000000+00:00", "Acme", Verdict::Fraudulent))
            .unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LOG_HEADER.join(","));
        let merchants: Vec<String> = log
            .load()
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|r| r.merchant)
            .collect();
        assert_eq!(merchants, vec!["Acme", "ShopCo"]);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let good = "2024-03-05 14:30:00.000000+00:00,ShopCo,grocery,42.5,14.0,14,5,3,Female,4111111111111111,Legitimate Transaction";
        let later = "2024-03-05 15:00:00.000000+00:00,Acme,grocery,9.0,1.0,15,5,3,Male,5500000000000004,Fraudulent Transaction";
        let contents = [
            LOG_HEADER.join(","),
            good.to_string(),
            "2024-03-05 14:40:00.000000+00:00,Sho".to_string(),
            "2024-03-05 14:45:00.000000+00:00,X,Y,1.0,1.0,1,1,1,Other,1,Maybe".to_string(),
            later.to_string(),
        ]
        .join("\n");
        std::fs::write(&path, contents + "\n").unwrap();

        let records = PredictionLog::new(&path).load().unwrap().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].merchant, "Acme");
        assert_eq!(records[1].merchant, "ShopCo");
    }

    #[test]
    fn test_offsets_order_across_clock_change() {
        // 01:30 EDT is 05:30 UTC; 01:10 EST an hour later is 06:10 UTC
        let mut records = vec![
            record("2024-11-03 01:30:00.000000-04:00", "before", Verdict::Legitimate),
            record("2024-11-03 01:10:00.000000-05:00", "after", Verdict::Legitimate),
        ];
        sort_most_recent_first(&mut records);

        let merchants: Vec<&str> = records.iter().map(|r| r.merchant.as_str()).collect();
        assert_eq!(merchants, vec!["after", "before"]);
    }

    #[test]
    fn test_embedded_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("log.csv"));
        let mut rec = record("2024-03-05 14:30:00.000000", "Shop, Co", Verdict::Legitimate);
        rec.gender = Gender::Female;
        log.append(&rec).unwrap();

        let loaded = log.load().unwrap().unwrap();
        assert_eq!(loaded, vec![rec]);
        assert!(lines(log.path())[1].contains("\"Shop, Co\""));
    }

    #[test]
    fn test_history_sorted_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("log.csv"));

        log.append(&record("2024-03-05 09:00:00.000000", "first", Verdict::Legitimate))
            .unwrap();
        log.append(&record("2024-03-06 08:00:00.000000", "latest", Verdict::Fraudulent))
            .unwrap();
        log.append(&record("2024-03-05 10:00:00.500000", "middle", Verdict::Legitimate))
            .unwrap();

        let merchants: Vec<String> = log
            .load()
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|r| r.merchant)
            .collect();
        assert_eq!(merchants, vec!["latest", "middle", "first"]);
    }

    #[test]
    fn test_unparseable_timestamps_sort_last() {
        let mut records = vec![
            record("garbled", "bad", Verdict::Legitimate),
            record("2024-03-05 09:00:00.000000", "old", Verdict::Legitimate),
            record("2024-03-06 09:00:00.000000", "new", Verdict::Legitimate),
        ];
        sort_most_recent_first(&mut records);

        let merchants: Vec<&str> = records.iter().map(|r| r.merchant.as_str()).collect();
        assert_eq!(merchants, vec!["new", "old", "bad"]);
    }

    #[test]
    fn test_history_reads_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("log.csv"));
        log.append(&record("2024-03-05 09:00:00.000000", "a", Verdict::Legitimate))
            .unwrap();
        log.append(&record("2024-03-05 09:00:00.000000", "b", Verdict::Fraudulent))
            .unwrap();

        assert_eq!(log.load().unwrap(), log.load().unwrap());
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(PredictionLog::new(dir.path().join("log.csv")));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = log.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        let merchant = format!("merchant-{t}-{i}");
                        log.append(&record("2024-03-05 09:00:00.000000", &merchant, Verdict::Legitimate))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = lines(log.path());
        assert_eq!(lines.len(), 1 + 8 * 25);
        assert_eq!(lines.iter().filter(|l| l.starts_with("datetime,")).count(), 1);
        assert_eq!(log.load().unwrap().unwrap().len(), 200);
        for line in &lines {
            assert_eq!(line.split(',').count(), 11);
        }
    }
}
