use anyhow::{anyhow, bail, Context as _, Result};
use chrono::Local;
use indicatif::MultiProgress;
use std::path::{Path, PathBuf};

use crate::args::{Args, Command};
use crate::date_format::DateFormat;
use crate::db::{self, AccessToken, DatabaseV1, DbCipher, DbPlaidAuth, Institution};
use crate::download::{
    format_expiry, qif_account_type, refresh_consent_expiry, DownloadRequest, Downloader,
};
use crate::plaid_api::{self, AccountsResponse, PlaidApi as _};
use crate::terminal::{
    self, style_account, style_detail, style_header, style_institution, BulletPointPrinter,
};

const DB_FILENAME: &str = "plaidqif.db";
const KEY_FILENAME: &str = "plaidqif.key";

pub async fn main(args: Args) -> Result<()> {
    let date_format = DateFormat::new(args.date_format)?;
    let mut cli = match args.command {
        Command::Init => Cli::new_init_db(&args.confdir, date_format).await?,
        _ => Cli::new_load_db(&args.confdir, date_format).await?,
    };
    match args.command {
        Command::Init => cli.main_init(),
        Command::AddInstitution { name } => cli.main_add_institution(name).await?,
        Command::ListInstitutions => cli.main_list_institutions().await?,
        Command::ListAccounts { institutions } => cli.main_list_accounts(&institutions).await?,
        Command::Download {
            from,
            until,
            outdir,
            institutions,
        } => cli.main_download(from, until, outdir, institutions).await?,
    }
    cli.save_db().await?;
    Ok(())
}

pub struct Cli {
    db: DatabaseV1,
    db_path: PathBuf,
    db_cipher: DbCipher,
    plaid_api: plaid_api::Plaid,
    date_format: DateFormat,
}

impl Cli {
    pub async fn new_init_db(confdir: &Path, date_format: DateFormat) -> Result<Self> {
        let db_path = confdir.join(DB_FILENAME);
        if tokio::fs::try_exists(&db_path).await? {
            bail!("Database {} already exists", db_path.display());
        }
        tokio::fs::create_dir_all(confdir)
            .await
            .with_context(|| format!("Failed to create config directory {}", confdir.display()))?;

        let key_path = confdir.join(KEY_FILENAME);
        let db_cipher = if tokio::fs::try_exists(&key_path).await? {
            DbCipher::load_key_file(&key_path).await?
        } else {
            DbCipher::create_key_file(&key_path).await?
        };

        let client_id = terminal::prompt("Plaid Client ID")?;
        let secret = terminal::prompt_secret("Plaid Secret")?;
        let db = DatabaseV1::new(DbPlaidAuth::new(client_id, secret));
        Ok(Self::_new(db, db_path, db_cipher, date_format))
    }

    pub async fn new_load_db(confdir: &Path, date_format: DateFormat) -> Result<Self> {
        let db_cipher = DbCipher::load_key_file(&confdir.join(KEY_FILENAME))
            .await
            .context("Failed to load database key. Did you run `plaidqif init`?")?;
        let db_path = confdir.join(DB_FILENAME);
        let db = db::load(&db_path, &db_cipher)
            .await
            .context("Failed to load database")?
            .ok_or_else(|| anyhow!("Database file {} not found", db_path.display()))?;
        Ok(Self::_new(db, db_path, db_cipher, date_format))
    }

    fn _new(db: DatabaseV1, db_path: PathBuf, db_cipher: DbCipher, date_format: DateFormat) -> Self {
        let plaid_api = plaid_api::Plaid::new(db.plaid_auth.to_api_auth());
        Self {
            db,
            db_path,
            db_cipher,
            plaid_api,
            date_format,
        }
    }

    pub async fn save_db(self) -> Result<()> {
        db::save(self.db, &self.db_path, &self.db_cipher)
            .await
            .context("Failed to save database")?;
        Ok(())
    }

    pub fn main_init(&self) {
        println!(
            "Created database {} for Plaid client {}",
            self.db_path.display(),
            self.db.plaid_auth.client_id(),
        );
    }

    pub async fn main_add_institution(&mut self, name: String) -> Result<()> {
        if self.db.institutions.get(&name).is_ok() {
            bail!("Institution '{name}' already exists");
        }
        let access_token = AccessToken::new(terminal::prompt_secret("Plaid Access Token")?);
        let response = self
            .plaid_api
            .accounts(&access_token)
            .await
            .context("Failed to verify access token with Plaid")?;
        let item_id = match &response.item.item_id {
            Some(item_id) => item_id.clone(),
            None => terminal::prompt("Plaid Item ID")?,
        };

        self.db
            .institutions
            .add(Institution::new(name.clone(), access_token, item_id))?;
        refresh_consent_expiry(
            &mut self.db.institutions,
            &name,
            response.item.consent_expiration_time,
        )?;

        println!();
        println!("{}", style_header("Adding institution:"));
        let institution = self.db.institutions.get(&name)?;
        print_institution(&BulletPointPrinter::new_stdout(), institution, &response)?;
        Ok(())
    }

    pub async fn main_list_institutions(&mut self) -> Result<()> {
        println!("{}", style_header("Institutions:"));
        if self.db.institutions.is_empty() {
            println!("(none)");
            return Ok(());
        }
        let printer = BulletPointPrinter::new_stdout();
        for institution in self.db.institutions.select(&[])? {
            let response = self.refresh_institution(&institution).await?;
            let institution = self.db.institutions.get(&institution.name)?;
            print_institution(&printer, institution, &response)?;
        }
        Ok(())
    }

    pub async fn main_list_accounts(&mut self, institutions: &[String]) -> Result<()> {
        println!("{}", style_header("Accounts:"));
        let printer = BulletPointPrinter::new_stdout();
        for institution in self.db.institutions.select(institutions)? {
            let response = self.refresh_institution(&institution).await?;
            let institution = self.db.institutions.get(&institution.name)?;
            printer.print_item(format!(
                "{} {}",
                style_institution(&institution.name),
                style_detail(&consent_description(institution)),
            ))?;
            let printer = printer.indent();
            if response.accounts.is_empty() {
                printer.print_item(style_detail("(none)"))?;
            }
            for account in &response.accounts {
                let qif_type = qif_account_type(&account.type_)
                    .map(|qif_type| qif_type.to_string())
                    .unwrap_or_else(|| "unsupported".to_string());
                printer.print_item(format!(
                    "{} {}",
                    style_account(&account.name),
                    style_detail(&format!(
                        "{} -> {qif_type} (id {})",
                        account.type_, account.id.0
                    )),
                ))?;
            }
        }
        Ok(())
    }

    pub async fn main_download(
        &mut self,
        from: String,
        until: Option<String>,
        outdir: Option<PathBuf>,
        institutions: Vec<String>,
    ) -> Result<()> {
        let until = until.unwrap_or_else(|| {
            self.date_format
                .format(Local::now().date_naive())
                .to_string()
        });
        let out_dir = match outdir {
            Some(outdir) => outdir,
            None => std::env::current_dir().context("Failed to get working directory")?,
        };
        let request = DownloadRequest {
            institutions,
            from,
            until,
            out_dir,
        };

        println!("{}", style_header("Downloading transactions:"));
        let progress = MultiProgress::new();
        Downloader::new(&self.plaid_api, &self.date_format, &progress)
            .download(&mut self.db.institutions, &request)
            .await
    }

    /// Lists the accounts of an institution and stores the consent expiry Plaid reports with them.
    async fn refresh_institution(&mut self, institution: &Institution) -> Result<AccountsResponse> {
        let response = self
            .plaid_api
            .accounts(&institution.access_token)
            .await
            .with_context(|| {
                format!(
                    "Failed to get accounts of institution '{}' from Plaid",
                    institution.name
                )
            })?;
        refresh_consent_expiry(
            &mut self.db.institutions,
            &institution.name,
            response.item.consent_expiration_time,
        )?;
        Ok(response)
    }
}

fn print_institution<W: terminal::LineWriter + Clone>(
    printer: &BulletPointPrinter<W>,
    institution: &Institution,
    response: &AccountsResponse,
) -> std::io::Result<()> {
    printer.print_item(style_institution(&institution.name))?;
    let printer = printer.indent();
    printer.print_item(style_detail(&format!("item {}", institution.item_id)))?;
    printer.print_item(style_detail(&format!(
        "{} accounts",
        response.accounts.len()
    )))?;
    printer.print_item(style_detail(&consent_description(institution)))
}

fn consent_description(institution: &Institution) -> String {
    match institution.consent_expires {
        Some(expires) => format!("consent expires {}", format_expiry(expires)),
        None => "consent expiry unknown".to_string(),
    }
}
