//! Report block rendering.
//!
//! Each failure becomes one fixed block:
//!
//! ```text
//! ############    <description>    ############
//! Path: <path>
//! Last modify before running: <timestamp>
//! Last modify after running: <timestamp>
//! <144 '-' characters>
//! ```

use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;

use cdft_core::FailureRecord;
use chrono::{DateTime, Local, TimeZone, Utc};

/// Width of the separator line closing each block.
pub const SEPARATOR_WIDTH: usize = 144;

const BANNER: &str = "############";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Renders every record into one buffer, timestamps in local time.
#[must_use]
pub fn render_records(records: &[FailureRecord]) -> String {
    render_records_in(records, &Local)
}

/// Appends the block for one record to `out`, timestamps in local time.
pub fn render_block(record: &FailureRecord, out: &mut String) {
    render_block_in(record, &Local, out);
}

pub(crate) fn render_records_in<Tz>(records: &[FailureRecord], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = String::with_capacity(records.len() * 320);
    for record in records {
        render_block_in(record, tz, &mut out);
    }
    out
}

fn render_block_in<Tz>(record: &FailureRecord, tz: &Tz, out: &mut String)
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    out.push_str(&format!(
        "{BANNER}    {}    {BANNER}\n",
        single_line(record.description())
    ));
    out.push_str(&format!("Path: {}\n", single_line(record.path.as_str())));
    out.push_str(&format!(
        "Last modify before running: {}\n",
        timestamp(record.modified_before, tz)
    ));
    out.push_str(&format!(
        "Last modify after running: {}\n",
        timestamp(record.modified_after, tz)
    ));
    out.push_str(&"-".repeat(SEPARATOR_WIDTH));
    out.push('\n');
}

/// Folds line breaks into spaces so a block keeps its five lines.
fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\r', '\n']) {
        Cow::Owned(text.replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

fn timestamp<Tz>(time: SystemTime, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    DateTime::<Utc>::from(time)
        .with_timezone(tz)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}
