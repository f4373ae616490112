use anyhow::{Context as _, Result};
use plaid::{PlaidAuth, PlaidClient};
use serde::{de::DeserializeOwned, Serialize};

use super::{accounts, transactions, AccountsResponse, PageRequest, PlaidApi, TransactionsPage};
use crate::db::AccessToken;

pub struct Plaid {
    client: PlaidClient,
}

impl Plaid {
    pub fn new(auth: PlaidAuth) -> Plaid {
        Plaid {
            client: PlaidClient::with_auth(auth),
        }
    }

    pub(super) fn client(&self) -> &PlaidClient {
        &self.client
    }
}

impl PlaidApi for Plaid {
    async fn accounts(&self, access_token: &AccessToken) -> Result<AccountsResponse> {
        accounts::get_accounts(self, access_token).await
    }

    async fn transactions_page(&self, request: &PageRequest) -> Result<TransactionsPage> {
        transactions::get_transactions_page(self, request).await
    }
}

/// Re-reads an API response through its JSON wire form into our own, narrower types.
pub(super) fn reshape<T: DeserializeOwned>(response: &impl Serialize) -> Result<T> {
    let value = serde_json::to_value(response).context("Failed to serialize Plaid response")?;
    serde_json::from_value(value).context("Unexpected Plaid response layout")
}
