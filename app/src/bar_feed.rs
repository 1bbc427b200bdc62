// In app/src/bar_feed.rs

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use core_types::Bar;
use futures::Stream;
use futures::stream;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Reads `timestamp,open,high,low,close[,volume]` bars from CSV with a header
/// row, one record per `next()`. Volume is accepted and ignored. The first
/// bad row is returned as an error and ends the sequence.
pub struct CsvBars<R> {
    records: csv::StringRecordsIntoIter<R>,
    line: usize,
    done: bool,
}

impl CsvBars<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<R: Read> CsvBars<R> {
    pub fn new(reader: R) -> Self {
        let records = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader)
            .into_records();
        // Header is line 1.
        Self { records, line: 1, done: false }
    }

    fn parse(&self, record: csv::Result<csv::StringRecord>) -> Result<Bar> {
        let line = self.line;
        let record = record.with_context(|| format!("CSV parse error on line {}", line))?;

        let timestamp = parse_timestamp(column(&record, 0, "timestamp", line)?).with_context(|| format!("line {}", line))?;
        Bar::new(
            timestamp,
            decimal(&record, 1, "open", line)?,
            decimal(&record, 2, "high", line)?,
            decimal(&record, 3, "low", line)?,
            decimal(&record, 4, "close", line)?,
        )
        .with_context(|| format!("line {}", line))
    }
}

impl<R: Read> Iterator for CsvBars<R> {
    type Item = Result<Bar>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let record = self.records.next()?;
        self.line += 1;

        let bar = self.parse(record);
        self.done = bar.is_err();
        Some(bar)
    }
}

/// Shared slot for the error that ended a feed early.
#[derive(Debug, Clone, Default)]
pub struct FeedStatus(Arc<Mutex<Option<anyhow::Error>>>);

impl FeedStatus {
    pub fn take_error(&self) -> Option<anyhow::Error> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }

    fn fail(&self, err: anyhow::Error) {
        tracing::error!(error = %format!("{:#}", err), "Bar feed stopped on a bad row.");
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(err);
        }
    }
}

/// Turns the rows into a bar stream for the engine. Rows are parsed as the
/// engine pulls them. A bad row ends the stream and is kept in the returned
/// [`FeedStatus`].
pub fn into_feed<R>(bars: CsvBars<R>) -> (impl Stream<Item = Bar> + Unpin + Send, FeedStatus)
where
    R: Read + Send + Unpin,
{
    let status = FeedStatus::default();
    let sink = status.clone();
    let feed = stream::iter(bars.map_while(move |bar| bar.map_err(|e| sink.fail(e)).ok()));
    (feed, status)
}

fn column<'r>(record: &'r csv::StringRecord, idx: usize, name: &str, line: usize) -> Result<&'r str> {
    record
        .get(idx)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("line {}: missing {} column", line, name))
}

fn decimal(record: &csv::StringRecord, idx: usize, name: &str, line: usize) -> Result<Decimal> {
    let raw = column(record, idx, name, line)?;
    Decimal::from_str(raw).map_err(|e| anyhow!("line {}: invalid {} value {:?}: {}", line, name, raw, e))
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC), `YYYY-MM-DD` (midnight UTC)
/// or integer unix seconds.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(secs) = raw.parse::<i64>() {
        if let Some(dt) = Utc.timestamp_opt(secs, 0).single() {
            return Ok(dt);
        }
    }
    Err(anyhow!("unrecognized timestamp {:?}", raw))
}
