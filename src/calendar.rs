use chrono::naive::NaiveDate;
use chrono::{Datelike, Weekday};
use num_traits::FromPrimitive;

use crate::error::{Error, ErrorKind, Result};

/// A full year of days, one `Month` per calendar month.
///
/// The year is fixed at construction; days are created up front and only
/// their scalar fields and entry lists mutate afterwards. Imports are
/// not transactional, so callers that need atomicity clone the tree
/// before a batch and fall back to the copy on error.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    year: i32,
    months: Vec<Month>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Month {
    number: u32,
    title: String,
    days: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    date: NaiveDate,
    event: String,
    bank_holiday: String,
    title: String,
    sunrise: String,
    sunset: String,
    entries: Vec<Entry>,
}

/// A timed record attached to a day. Empty strings mean "not set",
/// matching the persisted attribute model where every attribute is
/// always present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub time_start: String,
    pub time_end: String,
    pub duration: String,
    pub title: String,
}

/// The overwritable single-value fields of a `Day`, as opposed to its
/// entry sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    Event,
    BankHoliday,
    Title,
    Sunrise,
    Sunset,
}

fn days_of_month(year: i32, month: u32) -> Result<i64> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::from(ErrorKind::InvalidYear))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| Error::from(ErrorKind::InvalidYear))?;

    Ok(next.signed_duration_since(first).num_days())
}

impl Calendar {
    /// Builds the twelve months of `year` with one `Day` per date.
    pub fn new(year: i32) -> Result<Calendar> {
        let mut months = Vec::with_capacity(12);

        for number in 1..=12 {
            let title = chrono::Month::from_u32(number)
                .ok_or_else(|| Error::from(ErrorKind::InvalidYear))?
                .name()
                .to_owned();

            let mut days = Vec::with_capacity(31);
            for d in 1..=days_of_month(year, number)? {
                let date = NaiveDate::from_ymd_opt(year, number, d as u32)
                    .ok_or_else(|| Error::from(ErrorKind::InvalidYear))?;
                days.push(Day::new(date));
            }

            months.push(Month {
                number,
                title,
                days,
            });
        }

        log::debug!("built calendar tree for {}", year);

        Ok(Calendar { year, months })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn months(&self) -> &[Month] {
        &self.months
    }

    /// 1-indexed month lookup.
    pub fn month(&self, n: u32) -> Result<&Month> {
        self.months
            .get(n.wrapping_sub(1) as usize)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, &format!("no month {}", n)))
    }

    pub fn month_mut(&mut self, n: u32) -> Result<&mut Month> {
        self.months
            .get_mut(n.wrapping_sub(1) as usize)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, &format!("no month {}", n)))
    }

    /// Date-keyed day lookup; fails when `date` lies outside the
    /// calendar's year.
    pub fn day_at(&self, date: NaiveDate) -> Result<&Day> {
        if date.year() != self.year {
            return Err(Error::new(
                ErrorKind::NotFound,
                &format!("{} is outside calendar year {}", date, self.year),
            ));
        }
        self.month(date.month())?.day(date.day())
    }

    pub fn day_at_mut(&mut self, date: NaiveDate) -> Result<&mut Day> {
        if date.year() != self.year {
            return Err(Error::new(
                ErrorKind::NotFound,
                &format!("{} is outside calendar year {}", date, self.year),
            ));
        }
        self.month_mut(date.month())?.day_mut(date.day())
    }

    /// The days of the ISO week containing `date` that fall inside this
    /// year, Monday first. At year boundaries fewer than seven days may
    /// be returned.
    pub fn days_of_week(&self, date: NaiveDate) -> Result<Vec<&Day>> {
        self.day_at(date)?;

        let monday = date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64);

        Ok((0..7)
            .map(|offset| monday + chrono::Duration::days(offset))
            .filter_map(|d| self.day_at(d).ok())
            .collect())
    }
}

impl Month {
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    /// 1-indexed day-of-month lookup.
    pub fn day(&self, n: u32) -> Result<&Day> {
        self.days.get(n.wrapping_sub(1) as usize).ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                &format!("no day {} in {}", n, self.title),
            )
        })
    }

    pub fn day_mut(&mut self, n: u32) -> Result<&mut Day> {
        let title = self.title.clone();
        self.days.get_mut(n.wrapping_sub(1) as usize).ok_or_else(|| {
            Error::new(ErrorKind::NotFound, &format!("no day {} in {}", n, title))
        })
    }
}

impl Day {
    fn new(date: NaiveDate) -> Day {
        Day {
            date,
            event: String::new(),
            bank_holiday: String::new(),
            // days come up labelled with their weekday name
            title: date.format("%A").to_string(),
            sunrise: String::new(),
            sunset: String::new(),
            entries: Vec::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn day_of_month(&self) -> u32 {
        self.date.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn bank_holiday(&self) -> &str {
        &self.bank_holiday
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sunrise(&self) -> &str {
        &self.sunrise
    }

    pub fn sunset(&self) -> &str {
        &self.sunset
    }

    pub fn scalar(&self, field: ScalarField) -> &str {
        match field {
            ScalarField::Event => &self.event,
            ScalarField::BankHoliday => &self.bank_holiday,
            ScalarField::Title => &self.title,
            ScalarField::Sunrise => &self.sunrise,
            ScalarField::Sunset => &self.sunset,
        }
    }

    /// Overwrites a scalar field. A later import always replaces an
    /// earlier value, silently.
    pub fn set_scalar(&mut self, field: ScalarField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ScalarField::Event => self.event = value,
            ScalarField::BankHoliday => self.bank_holiday = value,
            ScalarField::Title => self.title = value,
            ScalarField::Sunrise => self.sunrise = value,
            ScalarField::Sunset => self.sunset = value,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn append_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Replaces the entry sequence wholesale; used by the slot scheduler
    /// path. Individual entries are never edited in place.
    pub fn replace_entries(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
    }
}
