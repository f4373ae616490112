use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = plaid_qif::args::parse();
    plaid_qif::cli::main(args).await
}
