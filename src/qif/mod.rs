//! Quicken Interchange Format output.
//!
//! Format reference: https://web.archive.org/web/20100222214101/http://web.intuit.com/support/quicken/docs/d_qif.html

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt::{Display, Formatter};

mod writer;

pub use writer::{WriteError, Writer};

/// QIF account types the exporter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    CCard,
    Bank,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::CCard => "CCard",
            AccountType::Bank => "Bank",
        }
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transaction, normalized from the upstream representation.
///
/// `amount` keeps the upstream sign convention. The writer flips it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub payee: String,
    pub amount: Decimal,
    pub memo: Option<String>,
}
