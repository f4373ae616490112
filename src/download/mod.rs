//! Downloads transactions from Plaid and writes one QIF file per account.
//!
//! Institutions, accounts and pages are processed strictly one after another. Any error aborts
//! the whole download, so a run either exports every requested account or fails.

use anyhow::{anyhow, bail, ensure, Context as _, Result};
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt as _;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::{
    collections::HashSet,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use crate::{
    date_format::DateFormat,
    db::{Institution, Institutions},
    plaid_api::{PageRequest, PlaidAccount, PlaidApi, TransactionsPage},
    qif,
    terminal::{
        style_account, style_detail, style_institution, style_warning, BulletPointPrinter,
        MultiProgressLineWriter,
    },
};

mod account_type;
mod consent;
mod normalize;
mod pages;
#[cfg(test)]
mod testutils;

pub use account_type::qif_account_type;
pub use consent::{check_consent, format_expiry, refresh_consent_expiry, ConsentCheck};
pub use normalize::{normalize, PENDING_MEMO};
pub use pages::transaction_pages;

const PROGRESS_TEMPLATE: &str = "{spinner} {msg} [{bar:30}] {pos}/{len}";

/// What to download, as given on the command line.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Institutions to download from. Empty means all configured institutions.
    pub institutions: Vec<String>,
    /// First day, inclusive, in the configured date format
    pub from: String,
    /// Last day, inclusive, in the configured date format
    pub until: String,
    pub out_dir: PathBuf,
}

pub struct Downloader<'a, A: PlaidApi> {
    api: &'a A,
    date_format: &'a DateFormat,
    progress: &'a MultiProgress,
}

impl<'a, A: PlaidApi> Downloader<'a, A> {
    pub fn new(api: &'a A, date_format: &'a DateFormat, progress: &'a MultiProgress) -> Self {
        Self {
            api,
            date_format,
            progress,
        }
    }

    /// Writes `<out_dir>/<institution>_<account>.qif` for every account with transactions in the range.
    ///
    /// Consent expiries reported by Plaid are written back to `institutions`.
    pub async fn download(
        &self,
        institutions: &mut Institutions,
        request: &DownloadRequest,
    ) -> Result<()> {
        ensure_directory(&request.out_dir).context("Invalid output directory")?;
        let from = self
            .date_format
            .parse(&request.from)
            .context("Cannot parse date to download transactions from")?;
        let until = self
            .date_format
            .parse(&request.until)
            .context("Cannot parse date to download transactions until")?;
        ensure!(
            from <= until,
            "Date to download transactions from ({}) is after the date to download them until ({})",
            request.from,
            request.until,
        );

        let selected = institutions.select(&request.institutions)?;
        let printer = BulletPointPrinter::new_multiprogress(self.progress);
        let mut outputs = OutputFiles::new(&request.out_dir);
        for institution in &selected {
            self.download_institution(institutions, institution, from, until, &mut outputs, &printer)
                .await?;
        }
        Ok(())
    }

    async fn download_institution(
        &self,
        institutions: &mut Institutions,
        institution: &Institution,
        from: NaiveDate,
        until: NaiveDate,
        outputs: &mut OutputFiles<'_>,
        printer: &BulletPointPrinter<MultiProgressLineWriter<'_>>,
    ) -> Result<()> {
        printer.print_item(style_institution(&institution.name))?;
        let printer = printer.indent();

        let response = self
            .api
            .accounts(&institution.access_token)
            .await
            .with_context(|| {
                format!(
                    "Failed to get accounts of institution '{}' from Plaid",
                    institution.name
                )
            })?;
        let expiry = refresh_consent_expiry(
            institutions,
            &institution.name,
            response.item.consent_expiration_time,
        )?;

        match check_consent(&institution.name, expiry, Utc::now()) {
            ConsentCheck::Reject(reason) => bail!(reason),
            ConsentCheck::ProceedWithWarning(warning) => {
                log::warn!("{warning}");
                printer.print_item(style_warning(&warning))?;
            }
            ConsentCheck::Proceed => {}
        }

        for account in &response.accounts {
            self.download_account(institution, account, from, until, outputs, &printer)
                .await
                .with_context(|| {
                    format!(
                        "Failed to download transactions for account '{}' from institution '{}'",
                        account.name, institution.name
                    )
                })?;
        }
        Ok(())
    }

    async fn download_account(
        &self,
        institution: &Institution,
        account: &PlaidAccount,
        from: NaiveDate,
        until: NaiveDate,
        outputs: &mut OutputFiles<'_>,
        printer: &BulletPointPrinter<MultiProgressLineWriter<'_>>,
    ) -> Result<()> {
        let first = PageRequest::first(
            institution.access_token.clone(),
            account.id.clone(),
            from,
            until,
        );
        let mut pages = std::pin::pin!(transaction_pages(self.api, first));

        let first_page = pages
            .try_next()
            .await?
            .ok_or_else(|| anyhow!("Plaid returned no transactions page"))?;
        if first_page.total_transactions == 0 {
            printer.print_item(format!(
                "{} {}",
                style_account(&account.name),
                style_detail("no transactions")
            ))?;
            return Ok(());
        }

        let account_type = qif_account_type(&account.type_)
            .ok_or_else(|| anyhow!("Unknown Plaid account type '{}'", account.type_))?;

        let path = outputs.claim(&institution.name, &account.name)?;
        log::info!("Writing {}", path.display());
        let file = File::create(&path)
            .with_context(|| format!("Failed to create QIF file {}", path.display()))?;
        let mut writer = qif::Writer::new(
            BufWriter::new(file),
            account.name.clone(),
            account_type,
            self.date_format.clone(),
        );

        let bar = self
            .progress
            .add(ProgressBar::new(first_page.total_transactions as u64));
        bar.set_style(ProgressStyle::with_template(PROGRESS_TEMPLATE)?);
        bar.set_message(account.name.clone());

        let mut written = 0;
        let mut page = Some(first_page);
        while let Some(current) = page {
            written += append_page(&mut writer, &current)?;
            bar.inc(current.transactions.len() as u64);
            page = pages.try_next().await?;
        }

        let file = writer
            .finish()?
            .into_inner()
            .map_err(|err| err.into_error())?;
        file.sync_all()
            .with_context(|| format!("Failed to close QIF file {}", path.display()))?;
        bar.finish_and_clear();

        printer.print_item(format!(
            "{} {}",
            style_account(&account.name),
            style_detail(&format!("{written} transactions -> {}", path.display()))
        ))?;
        Ok(())
    }
}

/// Normalizes one page and hands it to the writer. Returns the number of transactions written.
fn append_page<W: std::io::Write>(
    writer: &mut qif::Writer<W>,
    page: &TransactionsPage,
) -> Result<usize> {
    let transactions = page
        .transactions
        .iter()
        .map(normalize)
        .collect::<Result<Vec<_>>>()?;
    writer.write_transactions(&transactions)?;
    Ok(transactions.len())
}

/// Output paths handed out during one download, so no file is written twice.
struct OutputFiles<'a> {
    dir: &'a Path,
    claimed: HashSet<PathBuf>,
}

impl<'a> OutputFiles<'a> {
    fn new(dir: &'a Path) -> Self {
        Self {
            dir,
            claimed: HashSet::new(),
        }
    }

    /// `<dir>/<institution>_<account>.qif`, unless a previous account of this download already got that path.
    fn claim(&mut self, institution: &str, account: &str) -> Result<PathBuf> {
        ensure_file_name_part(institution, "Institution")?;
        ensure_file_name_part(account, "Account")?;
        let path = self.dir.join(format!("{institution}_{account}.qif"));
        ensure!(
            self.claimed.insert(path.clone()),
            "Another account was already written to {}",
            path.display()
        );
        Ok(path)
    }
}

fn ensure_file_name_part(name: &str, kind: &str) -> Result<()> {
    ensure!(
        !name.contains(|c: char| matches!(c, '/' | '\\' | '\0')),
        "{kind} name '{name}' cannot be used in a file name"
    );
    Ok(())
}

fn ensure_directory(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to access '{}'", path.display()))?;
    ensure!(metadata.is_dir(), "'{}' is not a directory", path.display());
    Ok(())
}
