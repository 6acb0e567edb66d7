//! Snapshot and hydration of the calendar tree over the persisted
//! markup schema:
//!
//! ```text
//! calendar[year]/month[n,title]/day[sdate,xday,event,bankholiday,
//! title,sunrise,sunset]/entry[time_start,time_end,duration,title]
//! ```
//!
//! Hydration rebuilds the tree through `Calendar::new` and date-keyed
//! lookup, so day dates stay derived from year/month/day-of-month and a
//! record outside the calendar's year is rejected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::calendar::{Calendar, Day, Entry, ScalarField};
use crate::error::{Error, ErrorKind, Result};

const SDATE_FORMAT: &str = "%Y-%b-%d";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "calendar")]
struct CalendarNode {
    #[serde(rename = "@year")]
    year: String,
    #[serde(rename = "month", default)]
    months: Vec<MonthNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MonthNode {
    #[serde(rename = "@n")]
    n: String,
    #[serde(rename = "@title")]
    title: String,
    #[serde(rename = "day", default)]
    days: Vec<DayNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DayNode {
    #[serde(rename = "@sdate")]
    sdate: String,
    #[serde(rename = "@xday")]
    xday: String,
    #[serde(rename = "@event")]
    event: String,
    #[serde(rename = "@bankholiday")]
    bankholiday: String,
    #[serde(rename = "@title")]
    title: String,
    #[serde(rename = "@sunrise")]
    sunrise: String,
    #[serde(rename = "@sunset")]
    sunset: String,
    #[serde(rename = "entry", default)]
    entries: Vec<EntryNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryNode {
    #[serde(rename = "@time_start")]
    time_start: String,
    #[serde(rename = "@time_end")]
    time_end: String,
    #[serde(rename = "@duration")]
    duration: String,
    #[serde(rename = "@title")]
    title: String,
}

fn day_node(day: &Day) -> DayNode {
    DayNode {
        sdate: day.date().format(SDATE_FORMAT).to_string(),
        xday: day.day_of_month().to_string(),
        event: day.event().to_owned(),
        bankholiday: day.bank_holiday().to_owned(),
        title: day.title().to_owned(),
        sunrise: day.sunrise().to_owned(),
        sunset: day.sunset().to_owned(),
        entries: day
            .entries()
            .iter()
            .map(|entry| EntryNode {
                time_start: entry.time_start.clone(),
                time_end: entry.time_end.clone(),
                duration: entry.duration.clone(),
                title: entry.title.clone(),
            })
            .collect(),
    }
}

fn snapshot(calendar: &Calendar) -> CalendarNode {
    CalendarNode {
        year: calendar.year().to_string(),
        months: calendar
            .months()
            .iter()
            .map(|month| MonthNode {
                n: month.number().to_string(),
                title: month.title().to_owned(),
                days: month.days().iter().map(day_node).collect(),
            })
            .collect(),
    }
}

pub fn to_string(calendar: &Calendar) -> Result<String> {
    quick_xml::se::to_string(&snapshot(calendar))
        .map_err(|err| Error::new(ErrorKind::Serialize, &err.to_string()))
}

pub fn from_str(markup: &str) -> Result<Calendar> {
    let node: CalendarNode = quick_xml::de::from_str(markup)?;

    let year: i32 = node.year.trim().parse().map_err(|_| {
        Error::new(
            ErrorKind::CalendarParse,
            &format!("invalid year {:?}", node.year),
        )
    })?;

    let mut calendar = Calendar::new(year)?;

    for month in &node.months {
        for record in &month.days {
            let date = NaiveDate::parse_from_str(&record.sdate, SDATE_FORMAT).map_err(|_| {
                Error::new(
                    ErrorKind::CalendarParse,
                    &format!("invalid day date {:?}", record.sdate),
                )
            })?;

            let day = calendar.day_at_mut(date)?;
            day.set_scalar(ScalarField::Event, record.event.as_str());
            day.set_scalar(ScalarField::BankHoliday, record.bankholiday.as_str());
            day.set_scalar(ScalarField::Title, record.title.as_str());
            day.set_scalar(ScalarField::Sunrise, record.sunrise.as_str());
            day.set_scalar(ScalarField::Sunset, record.sunset.as_str());
            day.replace_entries(
                record
                    .entries
                    .iter()
                    .map(|entry| Entry {
                        time_start: entry.time_start.clone(),
                        time_end: entry.time_end.clone(),
                        duration: entry.duration.clone(),
                        title: entry.title.clone(),
                    })
                    .collect(),
            );
        }
    }

    log::debug!("hydrated calendar for {}", year);
    Ok(calendar)
}

pub fn save(calendar: &Calendar, path: &Path) -> Result<()> {
    fs::write(path, to_string(calendar)?)?;
    log::info!("saved calendar to {}", path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<Calendar> {
    from_str(&fs::read_to_string(path)?)
}
