use clap::Parser;
use wkpdf::config::{CliArgs, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; a malformed one is not.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }

    let args = CliArgs::parse();
    wkpdf::telemetry::init(args.log_format)?;
    let config = Config::from_args(&args)?;

    wkpdf::serve(config).await
}
