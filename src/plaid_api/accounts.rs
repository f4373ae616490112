use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::client::{reshape, Plaid};
use crate::db::AccessToken;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: String) -> Self {
        Self(id)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaidAccount {
    #[serde(rename = "account_id")]
    pub id: AccountId,
    pub name: String,
    /// Plaid's account category, e.g. "credit" or "depository"
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaidItem {
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub consent_expiration_time: Option<DateTime<Utc>>,
}

/// The accounts of one item (institution) plus the item state reported alongside them.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountsResponse {
    pub accounts: Vec<PlaidAccount>,
    pub item: PlaidItem,
}

pub async fn get_accounts(client: &Plaid, access_token: &AccessToken) -> Result<AccountsResponse> {
    log::info!("Requesting accounts...");

    let response = client.client().accounts_get(access_token.get()).await?;
    let result = reshape(&response)?;

    log::info!("Requesting accounts...done");
    Ok(result)
}
