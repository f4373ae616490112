use anyhow::{ensure, Result};
use futures::{stream, Stream};

use crate::plaid_api::{PageRequest, PlaidApi, TransactionsPage};

/// Lazily fetches all pages of one account's transactions, starting with `first`.
///
/// The next page is only requested once the previous one was consumed. The offset advances
/// by the number of transactions actually returned, so short pages are fine.
pub fn transaction_pages<'a, A: PlaidApi>(
    api: &'a A,
    first: PageRequest,
) -> impl Stream<Item = Result<TransactionsPage>> + 'a {
    stream::try_unfold(Some(first), move |next| async move {
        match next {
            None => Ok(None),
            Some(request) => fetch_page(api, request).await.map(Some),
        }
    })
}

async fn fetch_page<A: PlaidApi>(
    api: &A,
    request: PageRequest,
) -> Result<(TransactionsPage, Option<PageRequest>)> {
    let page = api.transactions_page(&request).await?;
    let offset = request.offset + page.transactions.len();
    if offset >= page.total_transactions {
        return Ok((page, None));
    }
    ensure!(
        !page.transactions.is_empty(),
        "Plaid returned no transactions at offset {} but reported {} in total",
        request.offset,
        page.total_transactions,
    );
    let next = request.at_offset(offset);
    Ok((page, Some(next)))
}
