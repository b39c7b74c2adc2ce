use time::{format_description::FormatItem, macros::format_description, Date, Duration, OffsetDateTime};

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw.trim(), ISO_DATE)
}

/// Parses an optional query value, treating an empty string as absent.
pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<Date>, time::error::Parse> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s).map(Some),
    }
}

pub fn format_date(date: Date) -> String {
    // Formatting a plain date with this description cannot fail.
    date.format(ISO_DATE).unwrap_or_else(|_| date.to_string())
}

pub fn start_of_day_utc(date: Date) -> OffsetDateTime {
    date.midnight().assume_utc()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("from date {from} must not be after to date {to}")]
pub struct InvertedRange {
    pub from: String,
    pub to: String,
}

/// Optional inclusive calendar-date window. A missing bound is open on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl DateWindow {
    pub fn new(from: Option<Date>, to: Option<Date>) -> Self {
        Self { from, to }
    }

    #[cfg(test)]
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), InvertedRange> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(InvertedRange {
                from: format_date(from),
                to: format_date(to),
            }),
            _ => Ok(()),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, date: Date) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// Inclusive lower timestamp bound: `from` at 00:00 UTC.
    pub fn lower_bound(&self) -> Option<OffsetDateTime> {
        self.from.map(start_of_day_utc)
    }

    /// Exclusive upper timestamp bound: the day after `to` at 00:00 UTC.
    pub fn upper_bound_exclusive(&self) -> Option<OffsetDateTime> {
        self.to
            .map(|to| start_of_day_utc(to) + Duration::days(1))
    }
}
