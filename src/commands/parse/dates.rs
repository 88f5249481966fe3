use chrono::{Datelike, Local, NaiveDate};

/// Resolves year-less `dd.mm` fragments against a fixed "today".
///
/// Program sheets only print day and month, and every date on them refers to
/// the recent past: a date that would land after today belongs to last year.
#[derive(Debug, Clone, Copy)]
pub(super) struct DayMonthResolver {
    today: NaiveDate,
}

impl DayMonthResolver {
    pub(super) fn from_local_clock() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    pub(super) fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    /// `None` for malformed tokens and for day/month pairs that do not exist in
    /// the chosen year. The previous year is only tried when the current-year
    /// date is valid but lies in the future.
    pub(super) fn resolve(&self, token: &str) -> Option<NaiveDate> {
        let (day, month) = token.split_once('.')?;
        let day = day.trim().parse::<u32>().ok()?;
        let month = month.trim().parse::<u32>().ok()?;

        let year = self.today.year();
        let candidate = NaiveDate::from_ymd_opt(year, month, day)?;
        if candidate > self.today {
            return NaiveDate::from_ymd_opt(year - 1, month, day);
        }
        Some(candidate)
    }
}
