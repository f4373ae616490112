use anyhow::Result;
use chrono::NaiveDate;
use plaid::model::TransactionsGetRequestOptions;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{
    client::{reshape, Plaid},
    AccountId,
};
use crate::db::AccessToken;

/// Number of transactions requested per call to /transactions/get.
pub const PAGE_SIZE: usize = 100;

/// One /transactions/get call, scoped to a single account and an inclusive date range.
///
/// Requests are values. Moving to the next page builds a new request with [`PageRequest::at_offset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub access_token: AccessToken,
    pub account_id: AccountId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub offset: usize,
    pub count: usize,
}

impl PageRequest {
    pub fn first(
        access_token: AccessToken,
        account_id: AccountId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            access_token,
            account_id,
            start_date,
            end_date,
            offset: 0,
            count: PAGE_SIZE,
        }
    }

    pub fn at_offset(&self, offset: usize) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentMeta {
    #[serde(default)]
    pub payee: Option<String>,
}

/// A transaction the way Plaid reports it. Only the fields the export needs are kept.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    /// YYYY-MM-DD
    pub date: String,
    #[serde(default)]
    pub name: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub payment_meta: Option<PaymentMeta>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionsPage {
    pub transactions: Vec<RawTransaction>,
    pub total_transactions: usize,
}

pub async fn get_transactions_page(client: &Plaid, request: &PageRequest) -> Result<TransactionsPage> {
    log::debug!(
        "Requesting transactions for account {} at offset {}...",
        request.account_id.0,
        request.offset,
    );

    let options = TransactionsGetRequestOptions {
        account_ids: Some(vec![request.account_id.0.clone()]),
        count: Some(request.count.try_into()?),
        offset: Some(request.offset.try_into()?),
        ..Default::default()
    };
    let response = client
        .client()
        .transactions_get(
            request.access_token.get(),
            request.end_date,
            request.start_date,
        )
        .options(options)
        .await?;
    let page: TransactionsPage = reshape(&response)?;

    log::debug!(
        "Requesting transactions for account {} at offset {}...done, got {} of {}",
        request.account_id.0,
        request.offset,
        page.transactions.len(),
        page.total_transactions,
    );
    Ok(page)
}
