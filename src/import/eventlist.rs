//! Structured event-list text: blank-line-separated day blocks, one per
//! day. The block header carries the date and the day's event title;
//! each entry line matches one of three shapes:
//!
//! ```text
//! <start> (<duration>) <title>
//! <start>-<end> <title>
//! <start> <title>
//! ```

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveTime};

use nom::branch::alt;
use nom::bytes::complete::{is_not, take_till1};
use nom::character::complete::{char, multispace1};
use nom::combinator::rest;
use nom::sequence::{delimited, tuple};
use nom::IResult;

use crate::calendar::{Calendar, Entry, ScalarField};
use crate::config::Config;
use crate::datetime;
use crate::error::{Error, ErrorKind, Result};
use crate::slots;

/// One entry line before time resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLine<'a> {
    pub start: &'a str,
    pub end: Option<&'a str>,
    pub duration: Option<&'a str>,
    pub title: &'a str,
}

fn time_token(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace() || c == '-' || c == '(')(input)
}

fn with_duration(input: &str) -> IResult<&str, EntryLine> {
    let (remaining, (start, _, duration, _, title)) = tuple((
        time_token,
        multispace1,
        delimited(char('('), is_not(")"), char(')')),
        multispace1,
        rest,
    ))(input)?;

    Ok((
        remaining,
        EntryLine {
            start,
            end: None,
            duration: Some(duration),
            title,
        },
    ))
}

fn with_end(input: &str) -> IResult<&str, EntryLine> {
    let (remaining, (start, _, end, _, title)) = tuple((
        time_token,
        char('-'),
        time_token,
        multispace1,
        rest,
    ))(input)?;

    Ok((
        remaining,
        EntryLine {
            start,
            end: Some(end),
            duration: None,
            title,
        },
    ))
}

fn start_only(input: &str) -> IResult<&str, EntryLine> {
    let (remaining, (start, _, title)) = tuple((time_token, multispace1, rest))(input)?;

    Ok((
        remaining,
        EntryLine {
            start,
            end: None,
            duration: None,
            title,
        },
    ))
}

pub(crate) fn parse_entry_line(line: &str) -> Result<EntryLine> {
    alt((with_duration, with_end, start_only))(line.trim())
        .map(|(_, parsed)| parsed)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| {
            Error::new(
                ErrorKind::EventParse,
                &format!("unrecognized entry line {:?}", line),
            )
        })
}

/// Header line: a date (in any accepted format, up to three tokens)
/// followed by the day's free-text title.
fn parse_header(line: &str) -> Result<(NaiveDate, String)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    for width in (1..=tokens.len().min(3)).rev() {
        let candidate = tokens[..width].join(" ");
        if let Ok(date) = super::parse_date(&candidate) {
            return Ok((date, tokens[width..].join(" ")));
        }
    }

    Err(Error::new(
        ErrorKind::DateParse,
        &format!("no date in block header {:?}", line),
    ))
}

fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(trimmed);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

pub(crate) fn import(calendar: &mut Calendar, config: &Config, text: &str) -> Result<()> {
    let anchor = config.slots.anchor_time()?;

    for block in blocks(text) {
        let (date, title) = parse_header(block[0])?;

        // merge by start time, later lines overwrite earlier ones
        let mut merged: BTreeMap<NaiveTime, Entry> = BTreeMap::new();
        for line in &block[1..] {
            let parsed = parse_entry_line(line)?;
            let span = datetime::resolve(
                Some(parsed.start),
                parsed.end,
                parsed.duration,
                config.import.default_duration(),
            )?;
            merged.insert(
                span.start,
                Entry {
                    time_start: span.start_string(),
                    time_end: span.end_string(),
                    duration: span.duration_string(),
                    title: parsed.title.to_owned(),
                },
            );
        }

        let day = calendar.day_at_mut(date)?;
        day.set_scalar(ScalarField::Event, title);

        if merged.is_empty() {
            continue;
        }

        log::debug!("{}: {} event list entries", date, merged.len());

        if day.is_weekend() {
            // weekends keep raw chronological order, no padding
            day.replace_entries(merged.into_values().collect());
        } else {
            let offsets: Vec<i64> = merged
                .keys()
                .map(|start| {
                    datetime::seconds_from_midnight(*start)
                        - datetime::seconds_from_midnight(anchor)
                })
                .collect();

            let entries = slots::arrange(&offsets, &config.slots)
                .into_iter()
                .map(|row| match row {
                    Some(offset) => {
                        let start = anchor + Duration::seconds(offset);
                        merged.get(&start).cloned().unwrap_or_default()
                    }
                    None => Entry::default(),
                })
                .collect();
            day.replace_entries(entries);
        }
    }

    Ok(())
}
