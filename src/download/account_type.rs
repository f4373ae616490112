use crate::qif::AccountType;

const PLAID_TO_QIF_TYPE: &[(&str, AccountType)] = &[
    ("credit", AccountType::CCard),
    ("depository", AccountType::Bank),
];

/// Maps a Plaid account type to the QIF account type, or None if it can't be exported.
pub fn qif_account_type(plaid_type: &str) -> Option<AccountType> {
    PLAID_TO_QIF_TYPE
        .iter()
        .find(|(ty, _)| *ty == plaid_type)
        .map(|(_, qif_type)| *qif_type)
}
