use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};

use crate::db::Institutions;

/// Whether an institution's consent allows downloading transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentCheck {
    Proceed,
    ProceedWithWarning(String),
    Reject(String),
}

/// Evaluates the consent expiry of an institution against `now`, most urgent rule first.
pub fn check_consent(institution: &str, expires: DateTime<Utc>, now: DateTime<Utc>) -> ConsentCheck {
    let shown = format_expiry(expires);
    if expires < now {
        ConsentCheck::Reject(format!(
            "Institution '{institution}' consent expired at {shown}"
        ))
    } else if expires < now + Duration::minutes(10) {
        ConsentCheck::Reject(format!(
            "Institution '{institution}' consent expires within 10 minutes: {shown}"
        ))
    } else if expires < now + Duration::days(1) {
        ConsentCheck::ProceedWithWarning(format!(
            "Institution '{institution}' consent expires within 1 day: {shown}"
        ))
    } else if expires < now + Duration::weeks(1) {
        ConsentCheck::ProceedWithWarning(format!(
            "Institution '{institution}' consent expires within 1 week: {shown}"
        ))
    } else {
        ConsentCheck::Proceed
    }
}

/// Stores the consent expiry Plaid just reported for an institution and returns it.
///
/// Plaid not reporting an expiry is an error, there is nothing sensible to fall back to.
pub fn refresh_consent_expiry(
    institutions: &mut Institutions,
    institution: &str,
    reported: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>> {
    let expiry = reported
        .ok_or_else(|| anyhow!("Plaid reported no consent expiry for institution '{institution}'"))?;
    if institutions.update_consent_expiry(institution, expiry)? {
        log::info!(
            "Updated consent expiry of institution '{institution}' to {}",
            format_expiry(expiry)
        );
    }
    Ok(expiry)
}

pub fn format_expiry(expiry: DateTime<Utc>) -> String {
    expiry.format("%d %b %y %H:%M UTC").to_string()
}
