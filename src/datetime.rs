use chrono::{Duration, NaiveTime, Timelike};

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{digit1, multispace0, multispace1};
use nom::combinator::{all_consuming, map_res, value};
use nom::multi::separated_list1;
use nom::sequence::separated_pair;
use nom::IResult;

use crate::error::{Error, ErrorKind, Result};

/// Attribute-level time format of entry records.
pub const ENTRY_TIME_FORMAT: &str = "%H:%M";
/// Format of the time part in "<title> at <time>" scalar labels.
pub const LABEL_TIME_FORMAT: &str = "%H:%M%p";

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M%p", "%I%p"];

/// A span of the day, represented either by both endpoints or by a start
/// and a length. Arithmetic stays on whole seconds; wrapping past
/// midnight follows `NaiveTime` semantics.
#[derive(Clone, PartialEq, Eq)]
pub enum TimeSpan {
    TimePoints(NaiveTime, NaiveTime),
    Duration(NaiveTime, Duration),
}

impl TimeSpan {
    pub fn from_start_and_end(begin: NaiveTime, end: NaiveTime) -> Self {
        TimeSpan::TimePoints(begin, end)
    }

    pub fn from_start_and_duration(begin: NaiveTime, duration: Duration) -> Self {
        TimeSpan::Duration(begin, duration)
    }

    pub fn begin(&self) -> NaiveTime {
        match self {
            TimeSpan::TimePoints(begin, _) => *begin,
            TimeSpan::Duration(begin, _) => *begin,
        }
    }

    pub fn end(&self) -> NaiveTime {
        match self {
            TimeSpan::TimePoints(_, end) => *end,
            TimeSpan::Duration(begin, duration) => *begin + *duration,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            TimeSpan::TimePoints(begin, end) => {
                let duration = end.signed_duration_since(*begin);
                if duration < Duration::zero() {
                    // span crosses midnight
                    duration + Duration::hours(24)
                } else {
                    duration
                }
            }
            TimeSpan::Duration(_, duration) => *duration,
        }
    }
}

/// All three representations of a span, materialized.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResolvedSpan {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub duration: Duration,
}

impl ResolvedSpan {
    pub fn start_string(&self) -> String {
        self.start.format(ENTRY_TIME_FORMAT).to_string()
    }

    pub fn end_string(&self) -> String {
        self.end.format(ENTRY_TIME_FORMAT).to_string()
    }

    pub fn duration_string(&self) -> String {
        format_duration(self.duration)
    }
}

/// Completes a (start, end, duration) triple from the known parts.
///
/// Any two inputs determine the third. A lone start gets
/// `default_duration`; every other partial combination fails with
/// `InsufficientInput`.
pub fn resolve(
    start: Option<&str>,
    end: Option<&str>,
    duration: Option<&str>,
    default_duration: Duration,
) -> Result<ResolvedSpan> {
    let span = match (start, end, duration) {
        (Some(start), Some(end), _) => {
            TimeSpan::from_start_and_end(parse_time(start)?, parse_time(end)?)
        }
        (Some(start), None, Some(duration)) => {
            TimeSpan::from_start_and_duration(parse_time(start)?, parse_duration(duration)?)
        }
        (Some(start), None, None) => {
            TimeSpan::from_start_and_duration(parse_time(start)?, default_duration)
        }
        (None, Some(end), Some(duration)) => {
            let duration = parse_duration(duration)?;
            TimeSpan::from_start_and_duration(parse_time(end)? - duration, duration)
        }
        _ => {
            return Err(Error::new(
                ErrorKind::InsufficientInput,
                "need two of start/end/duration, or at least a start",
            ))
        }
    };

    Ok(ResolvedSpan {
        start: span.begin(),
        end: span.end(),
        duration: span.duration(),
    })
}

/// Parses a time-of-day string in any of the accepted formats
/// ("09:00", "09:00:30", "9:00pm", "7pm").
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let trimmed = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::TimeParse,
                &format!("unrecognized time {:?}", input),
            )
        })
}

pub fn seconds_from_midnight(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64
}

fn unit_secs(input: &str) -> IResult<&str, i64> {
    alt((
        value(86_400, alt((tag("days"), tag("day")))),
        value(3_600, alt((tag("hours"), tag("hour"), tag("hrs"), tag("hr")))),
        value(60, alt((tag("minutes"), tag("minute"), tag("mins"), tag("min")))),
        value(1, alt((tag("seconds"), tag("second"), tag("secs"), tag("sec")))),
    ))(input)
}

fn duration_component(input: &str) -> IResult<&str, i64> {
    let (rest, (count, unit)) = separated_pair(
        map_res(digit1, str::parse::<i64>),
        multispace0,
        unit_secs,
    )(input)?;

    Ok((rest, count * unit))
}

/// Parses a human-readable span like "1 hour 30 mins" to a duration.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let normalized = input.trim().to_ascii_lowercase();
    let parts = all_consuming(separated_list1(multispace1, duration_component))(
        normalized.as_str(),
    )
    .map_err(|_: nom::Err<nom::error::Error<&str>>| {
        Error::new(
            ErrorKind::DurationParse,
            &format!("unrecognized duration {:?}", input),
        )
    })?
    .1;

    Ok(Duration::seconds(parts.into_iter().sum::<i64>()))
}

/// Renders a duration largest-unit-first, e.g. "1 hour 30 mins".
pub fn format_duration(duration: Duration) -> String {
    let mut remaining = duration.num_seconds().max(0);
    if remaining == 0 {
        return "0 secs".to_owned();
    }

    const UNITS: &[(i64, &str, &str)] = &[
        (86_400, "day", "days"),
        (3_600, "hour", "hours"),
        (60, "min", "mins"),
        (1, "sec", "secs"),
    ];

    let mut parts = Vec::new();
    for &(secs, singular, plural) in UNITS {
        let count = remaining / secs;
        remaining %= secs;
        if count == 1 {
            parts.push(format!("1 {}", singular));
        } else if count > 1 {
            parts.push(format!("{} {}", count, plural));
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn start_and_duration_give_end() {
        let span = resolve(Some("09:00"), None, Some("30 mins"), Duration::minutes(10)).unwrap();
        assert_eq!(span.start, t(9, 0));
        assert_eq!(span.end, t(9, 30));
        assert_eq!(span.duration_string(), "30 mins");
    }

    #[test]
    fn start_and_end_give_duration() {
        let span = resolve(Some("09:00"), Some("09:10"), None, Duration::minutes(10)).unwrap();
        assert_eq!(span.duration_string(), "10 mins");
    }

    #[test]
    fn end_and_duration_give_start() {
        let span = resolve(None, Some("10:00"), Some("45 mins"), Duration::minutes(10)).unwrap();
        assert_eq!(span.start, t(9, 15));
    }

    #[test]
    fn lone_start_defaults_the_duration() {
        let span = resolve(Some("09:00"), None, None, Duration::minutes(10)).unwrap();
        assert_eq!(span.end, t(9, 10));
        assert_eq!(span.duration_string(), "10 mins");
    }

    #[test]
    fn too_few_inputs_are_rejected() {
        for (start, end, duration) in [
            (None, None, None),
            (None, Some("09:00"), None),
            (None, None, Some("10 mins")),
        ] {
            let err = resolve(start, end, duration, Duration::minutes(10)).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::InsufficientInput));
        }
    }

    #[test]
    fn time_formats() {
        assert_eq!(parse_time("09:00").unwrap(), t(9, 0));
        assert_eq!(parse_time("9:00pm").unwrap(), t(21, 0));
        assert_eq!(parse_time("7pm").unwrap(), t(19, 0));
        assert_eq!(parse_time("23:59:59").unwrap().hour(), 23);
        assert!(matches!(
            parse_time("noonish").unwrap_err().kind,
            ErrorKind::TimeParse
        ));
    }

    #[test]
    fn duration_round_trip() {
        assert_eq!(parse_duration("1 hour 30 mins").unwrap(), Duration::minutes(90));
        assert_eq!(format_duration(Duration::minutes(90)), "1 hour 30 mins");
        assert_eq!(format_duration(Duration::minutes(10)), "10 mins");
        assert_eq!(parse_duration("2 hrs").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration("1 day").unwrap(), Duration::days(1));
    }

    #[test]
    fn unrecognized_duration_phrasing_fails() {
        assert!(matches!(
            parse_duration("a little while").unwrap_err().kind,
            ErrorKind::DurationParse
        ));
        assert!(matches!(
            parse_duration("90 fortnights").unwrap_err().kind,
            ErrorKind::DurationParse
        ));
    }

    #[test]
    fn span_crossing_midnight_wraps() {
        let span = resolve(Some("23:30"), Some("00:30"), None, Duration::minutes(10)).unwrap();
        assert_eq!(span.duration, Duration::hours(1));
    }
}
