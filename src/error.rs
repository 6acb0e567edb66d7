use std::convert::From;
use std::error;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum ErrorKind {
    NotFound,
    DateParse,
    TimeParse,
    DurationParse,
    ScheduleParse,
    EventParse,
    InsufficientInput,
    InvalidYear,
    CalendarParse,
    Serialize,
    IOError(io::Error),
}

impl Error {
    pub fn new(kind: ErrorKind, msg: &str) -> Self {
        Error {
            kind,
            message: Some(msg.to_owned()),
        }
    }

    pub fn with_msg(mut self, message: &str) -> Self {
        self.message = Some(message.to_owned());
        self
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            kind,
            message: None,
        }
    }
}

impl From<chrono::ParseError> for Error {
    fn from(parse_error: chrono::ParseError) -> Error {
        Error::new(
            ErrorKind::TimeParse,
            format!("could not parse timestamp: {}", parse_error).as_str(),
        )
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Error {
        Error::from(ErrorKind::IOError(io_error))
    }
}

impl<E: std::fmt::Debug> From<nom::Err<E>> for Error {
    fn from(error: nom::Err<E>) -> Self {
        Error::new(
            ErrorKind::EventParse,
            &format!("error while parsing: {}", error),
        )
    }
}

impl From<rrule::RRuleError> for Error {
    fn from(error: rrule::RRuleError) -> Self {
        Error::new(
            ErrorKind::ScheduleParse,
            &format!("could not parse recurrence rule: {}", error),
        )
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(error: quick_xml::DeError) -> Self {
        Error::new(
            ErrorKind::CalendarParse,
            &format!("could not read calendar markup: {}", error),
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::new(
            ErrorKind::CalendarParse,
            &format!("could not read config: {}", error),
        )
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        if let ErrorKind::IOError(err) = err.kind {
            err
        } else {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                err.message.unwrap_or_else(|| "invalid format".to_owned()),
            )
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.kind.as_str(), msg),
            None => write!(f, "{}", self.kind.as_str()),
        }
    }
}

impl error::Error for Error {}

impl ErrorKind {
    pub fn as_str(&self) -> String {
        match self {
            ErrorKind::NotFound => "month or day out of range".to_owned(),
            ErrorKind::DateParse => "invalid date format".to_owned(),
            ErrorKind::TimeParse => "invalid time format".to_owned(),
            ErrorKind::DurationParse => "invalid duration format".to_owned(),
            ErrorKind::ScheduleParse => "invalid recurrence format".to_owned(),
            ErrorKind::EventParse => "invalid event format".to_owned(),
            ErrorKind::InsufficientInput => {
                "not enough known quantities to resolve time span".to_owned()
            }
            ErrorKind::InvalidYear => "year out of representable range".to_owned(),
            ErrorKind::CalendarParse => "invalid calendar format".to_owned(),
            ErrorKind::Serialize => "could not serialize calendar".to_owned(),
            ErrorKind::IOError(err) => err.to_string(),
        }
    }
}
