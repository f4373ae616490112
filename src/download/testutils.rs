use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::{cell::RefCell, collections::HashMap};

use crate::{
    db::AccessToken,
    plaid_api::{
        AccountId, AccountsResponse, PageRequest, PaymentMeta, PlaidAccount, PlaidApi, PlaidItem,
        RawTransaction, TransactionsPage,
    },
};

pub fn raw_transaction(
    date: &str,
    name: &str,
    payee: Option<&str>,
    amount: Decimal,
    pending: bool,
) -> RawTransaction {
    RawTransaction {
        date: date.to_string(),
        name: Some(name.to_string()),
        amount,
        pending,
        payment_meta: Some(PaymentMeta {
            payee: payee.map(str::to_string),
        }),
    }
}

/// `count` transactions of 1.00 each, one per day starting 2020-01-01.
pub fn many_transactions(count: usize) -> Vec<RawTransaction> {
    let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let date = start + chrono::Duration::days(i as i64);
            raw_transaction(
                &date.format("%Y-%m-%d").to_string(),
                &format!("payee {i}"),
                None,
                Decimal::ONE,
                false,
            )
        })
        .collect()
}

pub fn account(id: &str, name: &str, type_: &str) -> PlaidAccount {
    PlaidAccount {
        id: AccountId::new(id.to_string()),
        name: name.to_string(),
        type_: type_.to_string(),
    }
}

/// In-memory Plaid that records every call.
#[derive(Default)]
pub struct FakePlaid {
    items: HashMap<String, AccountsResponse>,
    transactions: HashMap<AccountId, Vec<RawTransaction>>,
    failing_accounts: Vec<AccountId>,
    /// Serve at most this many transactions per page, regardless of the requested count
    pub page_limit: Option<usize>,
    /// Report this total instead of the real number of transactions
    pub reported_total: Option<usize>,
    pub accounts_calls: RefCell<Vec<String>>,
    pub page_requests: RefCell<Vec<PageRequest>>,
}

impl FakePlaid {
    pub fn add_item(
        &mut self,
        access_token: &str,
        consent_expiration_time: Option<DateTime<Utc>>,
        accounts: Vec<PlaidAccount>,
    ) {
        self.items.insert(
            access_token.to_string(),
            AccountsResponse {
                accounts,
                item: PlaidItem {
                    item_id: Some(format!("item-{access_token}")),
                    consent_expiration_time,
                },
            },
        );
    }

    pub fn set_transactions(&mut self, account_id: &str, transactions: Vec<RawTransaction>) {
        self.transactions
            .insert(AccountId::new(account_id.to_string()), transactions);
    }

    pub fn fail_transactions_for(&mut self, account_id: &str) {
        self.failing_accounts
            .push(AccountId::new(account_id.to_string()));
    }

    pub fn requested_offsets(&self) -> Vec<usize> {
        self.page_requests
            .borrow()
            .iter()
            .map(|request| request.offset)
            .collect()
    }
}

impl PlaidApi for FakePlaid {
    async fn accounts(&self, access_token: &AccessToken) -> Result<AccountsResponse> {
        self.accounts_calls
            .borrow_mut()
            .push(access_token.get().to_string());
        self.items
            .get(access_token.get())
            .cloned()
            .ok_or_else(|| anyhow!("INVALID_ACCESS_TOKEN"))
    }

    async fn transactions_page(&self, request: &PageRequest) -> Result<TransactionsPage> {
        self.page_requests.borrow_mut().push(request.clone());
        if self.failing_accounts.contains(&request.account_id) {
            bail!("PRODUCT_NOT_READY");
        }
        let all = self
            .transactions
            .get(&request.account_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let count = request.count.min(self.page_limit.unwrap_or(usize::MAX));
        Ok(TransactionsPage {
            transactions: all.iter().skip(request.offset).take(count).cloned().collect(),
            total_transactions: self.reported_total.unwrap_or(all.len()),
        })
    }
}
