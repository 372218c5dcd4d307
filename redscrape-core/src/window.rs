//! Turns a symbolic time filter, or an explicit date range, into a concrete
//! [`TimeWindow`]. All instants are UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::debug;

use crate::types::{FilterKind, TimeWindow};

pub fn resolve(
    filter: FilterKind,
    now: DateTime<Utc>,
    explicit_start: Option<NaiveDate>,
    explicit_end: Option<NaiveDate>,
) -> TimeWindow {
    let full_history = TimeWindow {
        start: DateTime::<Utc>::UNIX_EPOCH,
        end: now,
    };

    let window = match filter {
        FilterKind::All => full_history,
        FilterKind::LastWeek => trailing(now, 7),
        FilterKind::LastMonth => trailing(now, 30),
        FilterKind::LastYear => trailing(now, 365),
        FilterKind::DateRange => match (explicit_start, explicit_end) {
            (Some(start), Some(end)) => TimeWindow {
                start: start_of_day(start),
                end: end_of_day(end),
            },
            _ => {
                debug!("Date range filter without both bounds, using full history");
                full_history
            }
        },
    };

    debug!(
        "Resolved {} window to [{}, {}]",
        filter,
        window.start.to_rfc3339(),
        window.end.to_rfc3339()
    );
    window
}

/// Advisory check for an inverted explicit range. Resolution never fails on
/// this; the resulting window just selects nothing.
pub fn date_range_warning(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Some(format!(
            "Start date {} must be before end date {}",
            start, end
        )),
        _ => None,
    }
}

fn trailing(now: DateTime<Utc>, days: i64) -> TimeWindow {
    TimeWindow {
        start: now - Duration::days(days),
        end: now,
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last microsecond of the day, 23:59:59.999999.
fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::microseconds(1)
}
