//! A one-year calendar kept as a hierarchical record tree
//! (year → month → day → entry), with normalization of heterogeneous
//! event sources into that tree and a fixed-capacity slot layout for a
//! day's entries.

pub mod calendar;
pub mod config;
pub mod datetime;
pub mod error;
pub mod import;
pub mod logging;
pub mod ser;
pub mod slots;

pub use calendar::{Calendar, Day, Entry, Month, ScalarField};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use import::{Normalizer, Source};
