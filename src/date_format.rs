use anyhow::{bail, Context as _, Result};
use chrono::{
    format::{DelayedFormat, Item, StrftimeItems},
    NaiveDate,
};
use std::fmt::Write as _;

/// A validated chrono strftime format, used for command line dates and for QIF date lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat(String);

impl DateFormat {
    /// DD/MM/YYYY
    pub const DEFAULT: &'static str = "%d/%m/%Y";

    pub fn new(format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        if format.is_empty() {
            bail!("Date format must not be empty");
        }
        if StrftimeItems::new(&format).any(|item| item == Item::Error) {
            bail!("Invalid date format '{format}'");
        }
        // Time or timezone fields parse fine but fail when rendering a plain date.
        let mut rendered = String::new();
        if write!(rendered, "{}", NaiveDate::default().format(&format)).is_err() {
            bail!("Date format '{format}' must only contain date fields");
        }
        Ok(Self(format))
    }

    pub fn parse(&self, input: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(input, &self.0)
            .with_context(|| format!("Cannot parse date '{input}' with format '{}'", self.0))
    }

    pub fn format(&self, date: NaiveDate) -> DelayedFormat<StrftimeItems<'_>> {
        date.format(&self.0)
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}
