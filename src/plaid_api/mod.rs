use anyhow::Result;

use crate::db::AccessToken;

mod accounts;
mod client;
mod transactions;

pub use accounts::{AccountId, AccountsResponse, PlaidAccount, PlaidItem};
pub use client::Plaid;
pub use transactions::{PageRequest, PaymentMeta, RawTransaction, TransactionsPage, PAGE_SIZE};

/// The two Plaid operations the export depends on.
#[allow(async_fn_in_trait)]
pub trait PlaidApi {
    /// /accounts/get: the item's accounts and its current state, including consent expiry.
    async fn accounts(&self, access_token: &AccessToken) -> Result<AccountsResponse>;

    /// /transactions/get: one page of an account's transactions plus the total count.
    async fn transactions_page(&self, request: &PageRequest) -> Result<TransactionsPage>;
}
