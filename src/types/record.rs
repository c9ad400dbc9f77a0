//! Prediction log record

use crate::types::{Gender, TransactionInput, Verdict};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Column header of the prediction log, in write order
pub const LOG_HEADER: [&str; 11] = [
    "datetime", "merchant", "category", "amt", "distance", "hour", "day", "month", "gender",
    "cc_num", "result",
];

/// Timestamp format of the `datetime` column. The UTC offset keeps rows
/// orderable across daylight-saving changes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";

/// Offset-less format of older rows, read as local time
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One row of the append-only prediction log.
///
/// Coordinates are not kept; the computed distance replaces them.
/// Field order matches [`LOG_HEADER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub datetime: String,
    pub merchant: String,
    pub category: String,
    pub amt: f64,
    pub distance: f64,
    pub hour: u8,
    pub day: u8,
    pub month: u8,
    pub gender: Gender,
    pub cc_num: String,
    pub result: Verdict,
}

impl LogRecord {
    /// Build a record for a submission checked at `at`
    pub fn new<Tz: TimeZone>(
        input: &TransactionInput,
        distance_km: f64,
        verdict: Verdict,
        at: &DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            datetime: at.format(TIMESTAMP_FORMAT).to_string(),
            merchant: input.merchant.clone(),
            category: input.category.clone(),
            amt: input.amt,
            distance: distance_km,
            hour: input.hour,
            day: input.day,
            month: input.month,
            gender: input.gender,
            cc_num: input.cc_num.clone(),
            result: verdict,
        }
    }

    /// Build a record stamped with the current local time
    pub fn now(input: &TransactionInput, distance_km: f64, verdict: Verdict) -> Self {
        Self::new(input, distance_km, verdict, &Local::now())
    }

    /// Parsed `datetime` column, if it is in the written format.
    ///
    /// Rows without an offset are taken as local time; an ambiguous local
    /// time resolves to its earlier instant.
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        if let Ok(at) = DateTime::parse_from_str(&self.datetime, TIMESTAMP_FORMAT) {
            return Some(at);
        }
        let naive = NaiveDateTime::parse_from_str(&self.datetime, LEGACY_TIMESTAMP_FORMAT).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|at| at.fixed_offset())
    }
}
