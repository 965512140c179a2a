use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

const TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Source of process-local wall-clock time.
///
/// The local offset can only be queried reliably while the process is
/// single-threaded on some platforms, so it is captured once with
/// [`LocalClock::detect`] before the runtime starts. Later reads still try the
/// live offset first so DST changes are picked up where the platform allows.
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    fallback: UtcOffset,
}

impl LocalClock {
    pub fn detect() -> Self {
        Self {
            fallback: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    pub fn with_offset(fallback: UtcOffset) -> Self {
        Self { fallback }
    }

    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc().to_offset(self.fallback))
    }
}

/// `YYYY-MM-DD HH:MM:SS` in the timestamp's own offset.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(TIMESTAMP)
        .unwrap_or_else(|_| String::from("0000-00-00 00:00:00"))
}

/// `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(DATE)
        .unwrap_or_else(|_| String::from("0000-00-00"))
}

/// Human-readable elapsed time: seconds and minutes always, hours once past
/// an hour, days once past a day.
pub fn format_elapsed(elapsed: time::Duration) -> String {
    let seconds = elapsed.as_seconds_f64().max(0.0);
    let minutes = seconds / 60.0;
    let mut out = format!("{seconds:.2}s ({minutes:.2} minutes)");
    if minutes > 60.0 {
        let hours = minutes / 60.0;
        out.push_str(&format!(" ({hours:.2} hours)"));
        if hours > 24.0 {
            let days = hours / 24.0;
            out.push_str(&format!(" ({days:.2} days)"));
        }
    }
    out
}
