use anyhow::{Context as _, Result};
use chrono::NaiveDate;

use crate::{plaid_api::RawTransaction, qif::Transaction};

const PLAID_DATE_FORMAT: &str = "%Y-%m-%d";

/// Memo attached to transactions that haven't posted yet.
pub const PENDING_MEMO: &str = "Pending";

/// Converts a Plaid transaction into a QIF transaction.
///
/// The payee is Plaid's payment meta payee if it has one, the transaction name otherwise.
/// The amount keeps Plaid's sign.
pub fn normalize(raw: &RawTransaction) -> Result<Transaction> {
    let name = raw.name.as_deref().unwrap_or_default().trim();
    let payee = raw
        .payment_meta
        .as_ref()
        .and_then(|meta| meta.payee.as_deref())
        .map(str::trim)
        .filter(|payee| !payee.is_empty())
        .unwrap_or(name);

    let date = NaiveDate::parse_from_str(&raw.date, PLAID_DATE_FORMAT).with_context(|| {
        format!(
            "Failed to parse transaction date '{}' for payee '{payee}'",
            raw.date
        )
    })?;

    Ok(Transaction {
        date,
        payee: payee.to_string(),
        amount: raw.amount,
        memo: raw.pending.then(|| PENDING_MEMO.to_string()),
    })
}
