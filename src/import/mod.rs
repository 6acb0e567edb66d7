//! Normalizes heterogeneous source batches into calendar mutations.
//!
//! Every source kind resolves each record's date to a day of the tree
//! and either overwrites one of the day's scalar fields or creates entry
//! records. Imports are fail-fast and non-transactional: the first
//! malformed record aborts the batch, mutations already applied stay.

pub mod eventlist;

use chrono::{Datelike, NaiveDate, NaiveTime};
use itertools::Itertools;
use rrule::RRuleSet;

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::character::complete::multispace0;
use nom::combinator::all_consuming;
use nom::sequence::{delimited, separated_pair};
use nom::IResult;

use crate::calendar::{Calendar, Entry, ScalarField};
use crate::config::Config;
use crate::datetime::{self, ENTRY_TIME_FORMAT, LABEL_TIME_FORMAT};
use crate::error::{Error, ErrorKind, Result};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y-%b-%d", "%d %b %Y"];

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::DateParse,
                &format!("unrecognized date {:?}", input),
            )
        })
}

/// A dated free-text label, e.g. a bank holiday.
#[derive(Debug, Clone)]
pub struct DatedLabel {
    pub date: String,
    pub label: String,
}

/// A dated time-of-day observation, e.g. a sunrise or sunset time.
#[derive(Debug, Clone)]
pub struct SunTime {
    pub date: String,
    pub time: String,
}

/// A recurring schedule: RFC 5545 recurrence text (`DTSTART:…\nRRULE:…`)
/// plus a title. The rule resolves to one fixed time-of-day, computed
/// once; every occurrence date inside the calendar year receives one
/// entry. `description` is carried for downstream consumers and not
/// written into the tree.
#[derive(Debug, Clone)]
pub struct RecurringSchedule {
    pub schedule: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct EventRecord {
    pub date: String,
    pub title: String,
    pub desc: Option<String>,
    pub time: Option<String>,
}

/// A flat batch of day-event records with an optional source label and a
/// target scalar for records that carry no time of their own.
#[derive(Debug, Clone)]
pub struct EventBatch {
    pub label: Option<String>,
    pub target: ScalarField,
    pub records: Vec<EventRecord>,
}

impl EventBatch {
    pub fn new(records: Vec<EventRecord>) -> Self {
        EventBatch {
            label: None,
            target: ScalarField::Event,
            records,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_owned());
        self
    }

    pub fn with_target(mut self, target: ScalarField) -> Self {
        self.target = target;
        self
    }
}

/// The finite set of source kinds the normalizer accepts.
pub enum Source {
    BankHolidays(Vec<DatedLabel>),
    SunriseTimes(Vec<SunTime>),
    SunsetTimes(Vec<SunTime>),
    Recurring(RecurringSchedule),
    DayEvents(EventBatch),
    EventList(String),
}

pub struct Normalizer<'a> {
    calendar: &'a mut Calendar,
    config: &'a Config,
}

impl<'a> Normalizer<'a> {
    pub fn new(calendar: &'a mut Calendar, config: &'a Config) -> Self {
        Normalizer { calendar, config }
    }

    pub fn import(&mut self, source: &Source) -> Result<()> {
        match source {
            Source::BankHolidays(records) => self.import_bank_holidays(records),
            Source::SunriseTimes(records) => self.import_sun_times(records, ScalarField::Sunrise),
            Source::SunsetTimes(records) => self.import_sun_times(records, ScalarField::Sunset),
            Source::Recurring(schedule) => self.import_recurring(schedule),
            Source::DayEvents(batch) => self.import_day_events(batch),
            Source::EventList(text) => self.import_event_list(text),
        }
    }

    pub fn import_bank_holidays(&mut self, records: &[DatedLabel]) -> Result<()> {
        for record in records {
            let date = parse_date(&record.date)?;
            self.calendar
                .day_at_mut(date)?
                .set_scalar(ScalarField::BankHoliday, record.label.as_str());
        }

        log::info!("imported {} bank holiday records", records.len());
        Ok(())
    }

    pub fn import_sun_times(&mut self, records: &[SunTime], field: ScalarField) -> Result<()> {
        for record in records {
            let date = parse_date(&record.date)?;
            self.calendar
                .day_at_mut(date)?
                .set_scalar(field, record.time.as_str());
        }

        log::info!("imported {} {:?} records", records.len(), field);
        Ok(())
    }

    /// Expands a recurring schedule into one entry per occurrence date
    /// inside the calendar year, all sharing the rule's fixed
    /// time-of-day.
    pub fn import_recurring(&mut self, schedule: &RecurringSchedule) -> Result<()> {
        let rule: RRuleSet = schedule.schedule.parse()?;
        let year = self.calendar.year();

        let mut time_start: Option<String> = None;
        let mut count = 0usize;

        for occurrence in (&rule).into_iter() {
            if occurrence.year() > year {
                break;
            }

            let fixed = time_start.get_or_insert_with(|| {
                occurrence.time().format(ENTRY_TIME_FORMAT).to_string()
            });

            if occurrence.year() < year {
                continue;
            }

            let date = NaiveDate::from_ymd_opt(year, occurrence.month(), occurrence.day())
                .ok_or_else(|| Error::from(ErrorKind::DateParse))?;

            self.calendar.day_at_mut(date)?.append_entry(Entry {
                time_start: fixed.clone(),
                title: schedule.title.clone(),
                ..Entry::default()
            });
            count += 1;
        }

        log::info!(
            "expanded recurring schedule {:?} to {} entries",
            schedule.title,
            count
        );
        Ok(())
    }

    pub fn import_day_events(&mut self, batch: &EventBatch) -> Result<()> {
        for record in &batch.records {
            let date = parse_date(&record.date)?;

            match record.time.as_deref() {
                Some(time) => {
                    if let Some((start, end)) = split_time_range(time) {
                        let span = datetime::resolve(
                            Some(start),
                            Some(end),
                            None,
                            self.config.import.default_duration(),
                        )?;
                        let entry = Entry {
                            time_start: span.start_string(),
                            time_end: span.end_string(),
                            duration: span.duration_string(),
                            title: composed_title(record, batch.label.as_deref()),
                        };
                        self.calendar.day_at_mut(date)?.append_entry(entry);
                    } else {
                        let moment = datetime::parse_time(time)?;
                        let label = format!(
                            "{} at {}",
                            composed_title(record, batch.label.as_deref()),
                            moment.format(LABEL_TIME_FORMAT)
                        );
                        self.calendar
                            .day_at_mut(date)?
                            .set_scalar(ScalarField::Event, label);
                    }
                }
                None => {
                    // a bare date resolves to midnight
                    let moment = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
                    let label = format!(
                        "{} at {}",
                        record.title,
                        moment.format(LABEL_TIME_FORMAT)
                    );
                    self.calendar
                        .day_at_mut(date)?
                        .set_scalar(batch.target, label);
                }
            }
        }

        log::info!("imported {} day-event records", batch.records.len());
        Ok(())
    }

    pub fn import_event_list(&mut self, text: &str) -> Result<()> {
        eventlist::import(self.calendar, self.config, text)
    }
}

/// "title: source label: description", absent parts omitted.
fn composed_title(record: &EventRecord, label: Option<&str>) -> String {
    vec![Some(record.title.as_str()), label, record.desc.as_deref()]
        .into_iter()
        .flatten()
        .join(": ")
}

fn time_range(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming(separated_pair(
        is_not(" \t-"),
        delimited(multispace0, alt((tag("to"), tag("-"))), multispace0),
        is_not(" \t"),
    ))(input)
}

/// Splits `"<start> to <end>"` / `"<start>-<end>"`; `None` when the text
/// is not shaped like a range.
fn split_time_range(input: &str) -> Option<(&str, &str)> {
    time_range(input.trim()).ok().map(|(_, pair)| pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar() -> Calendar {
        Calendar::new(2024).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bank_holiday_import_overwrites() {
        let mut cal = calendar();
        let config = Config::default();
        let mut normalizer = Normalizer::new(&mut cal, &config);

        for label in ["Christmas Day", "Xmas"] {
            normalizer
                .import(&Source::BankHolidays(vec![DatedLabel {
                    date: "2024-12-25".to_owned(),
                    label: label.to_owned(),
                }]))
                .unwrap();
        }

        let day = cal.day_at(date(2024, 12, 25)).unwrap();
        assert_eq!(day.bank_holiday(), "Xmas");
    }

    #[test]
    fn sun_times_land_on_their_fields() {
        let mut cal = calendar();
        let config = Config::default();
        let mut normalizer = Normalizer::new(&mut cal, &config);

        normalizer
            .import(&Source::SunriseTimes(vec![SunTime {
                date: "2024-06-21".to_owned(),
                time: "04:43".to_owned(),
            }]))
            .unwrap();
        normalizer
            .import(&Source::SunsetTimes(vec![SunTime {
                date: "2024-06-21".to_owned(),
                time: "21:21".to_owned(),
            }]))
            .unwrap();

        let day = cal.day_at(date(2024, 6, 21)).unwrap();
        assert_eq!(day.sunrise(), "04:43");
        assert_eq!(day.sunset(), "21:21");
    }

    #[test]
    fn recurring_schedule_expands_with_fixed_time() {
        let mut cal = calendar();
        let config = Config::default();
        let mut normalizer = Normalizer::new(&mut cal, &config);

        normalizer
            .import(&Source::Recurring(RecurringSchedule {
                schedule: "DTSTART:20240601T090000Z\nRRULE:FREQ=DAILY;COUNT=3".to_owned(),
                title: "Morning run".to_owned(),
                description: String::new(),
            }))
            .unwrap();

        for d in 1..=3 {
            let day = cal.day_at(date(2024, 6, d)).unwrap();
            assert_eq!(day.entries().len(), 1);
            assert_eq!(day.entries()[0].time_start, "09:00");
            assert_eq!(day.entries()[0].title, "Morning run");
        }
        assert!(cal.day_at(date(2024, 6, 4)).unwrap().entries().is_empty());
    }

    #[test]
    fn unparsable_schedule_text_is_rejected() {
        let mut cal = calendar();
        let config = Config::default();
        let mut normalizer = Normalizer::new(&mut cal, &config);

        let err = normalizer
            .import(&Source::Recurring(RecurringSchedule {
                schedule: "every other tuesday".to_owned(),
                title: "?".to_owned(),
                description: String::new(),
            }))
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ScheduleParse));
    }

    #[test]
    fn ranged_day_event_becomes_an_entry() {
        let mut cal = calendar();
        let config = Config::default();
        let mut normalizer = Normalizer::new(&mut cal, &config);

        let batch = EventBatch::new(vec![EventRecord {
            date: "2024-03-08".to_owned(),
            title: "Workshop".to_owned(),
            desc: Some("bring a laptop".to_owned()),
            time: Some("09:30 to 11:00".to_owned()),
        }])
        .with_label("office");

        normalizer.import(&Source::DayEvents(batch)).unwrap();

        let day = cal.day_at(date(2024, 3, 8)).unwrap();
        assert_eq!(day.entries().len(), 1);
        let entry = &day.entries()[0];
        assert_eq!(entry.time_start, "09:30");
        assert_eq!(entry.time_end, "11:00");
        assert_eq!(entry.duration, "1 hour 30 mins");
        assert_eq!(entry.title, "Workshop: office: bring a laptop");
    }

    #[test]
    fn dashed_range_parses_too() {
        assert_eq!(split_time_range("19:00-21:00"), Some(("19:00", "21:00")));
        assert_eq!(split_time_range("7pm to 9pm"), Some(("7pm", "9pm")));
        assert_eq!(split_time_range("7pm"), None);
    }

    #[test]
    fn moment_day_event_writes_the_event_scalar() {
        let mut cal = calendar();
        let config = Config::default();
        let mut normalizer = Normalizer::new(&mut cal, &config);

        let batch = EventBatch::new(vec![EventRecord {
            date: "2024-03-08".to_owned(),
            title: "Dinner".to_owned(),
            desc: None,
            time: Some("7pm".to_owned()),
        }]);

        normalizer.import(&Source::DayEvents(batch)).unwrap();

        let day = cal.day_at(date(2024, 3, 8)).unwrap();
        assert!(day.entries().is_empty());
        assert_eq!(day.event(), "Dinner at 19:00PM");
    }

    #[test]
    fn timeless_day_event_hits_the_selected_scalar() {
        let mut cal = calendar();
        let config = Config::default();
        let mut normalizer = Normalizer::new(&mut cal, &config);

        let batch = EventBatch::new(vec![EventRecord {
            date: "2024-03-08".to_owned(),
            title: "Dentist".to_owned(),
            desc: None,
            time: None,
        }])
        .with_target(ScalarField::Title);

        normalizer.import(&Source::DayEvents(batch)).unwrap();

        let day = cal.day_at(date(2024, 3, 8)).unwrap();
        assert_eq!(day.title(), "Dentist at 00:00AM");
        assert_eq!(day.event(), "");
    }

    #[test]
    fn batches_fail_fast_and_keep_earlier_mutations() {
        let mut cal = calendar();
        let config = Config::default();
        let mut normalizer = Normalizer::new(&mut cal, &config);

        let err = normalizer
            .import(&Source::BankHolidays(vec![
                DatedLabel {
                    date: "2024-01-01".to_owned(),
                    label: "New Year".to_owned(),
                },
                DatedLabel {
                    date: "sometime in spring".to_owned(),
                    label: "?".to_owned(),
                },
            ]))
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::DateParse));
        // the first record's overwrite is not rolled back
        let day = cal.day_at(date(2024, 1, 1)).unwrap();
        assert_eq!(day.bank_holiday(), "New Year");
    }

    #[test]
    fn dates_outside_the_year_are_not_found() {
        let mut cal = calendar();
        let config = Config::default();
        let mut normalizer = Normalizer::new(&mut cal, &config);

        let err = normalizer
            .import(&Source::BankHolidays(vec![DatedLabel {
                date: "2025-01-01".to_owned(),
                label: "New Year".to_owned(),
            }]))
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound));
    }
}
