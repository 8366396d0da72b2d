pub mod cli;
pub mod config;
pub mod logging;
pub mod model;
pub mod providers;
pub mod repl;
pub mod session;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use reqwest::Client;
use tracing::info;

use cli::Cli;
use config::Config;
use repl::run_repl;
use session::Session;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Cli::parse();
    let cfg = Config::from_env().with_overrides(args.model.clone(), args.api_key.clone());

    if args.query.is_none() && !args.interactive {
        Cli::command().print_help().context("Failed to print help")?;
        println!("\nTip: Use --interactive to start a chat session or --query to ask a question");
        return Ok(());
    }

    info!(
        model = %cfg.model,
        api_base_url = %cfg.api_base_url,
        "loaded runtime configuration"
    );
    cfg.require_api_key()?;

    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .build()
        .context("Failed to initialize HTTP client")?;

    // single query wins over --interactive when both are given
    if let Some(query) = args.query.as_deref() {
        let session = Session::new(&client, &cfg);
        let response = session.send_once(query).await;
        println!("{response}");
        return Ok(());
    }

    let mut session = Session::new(&client, &cfg);
    run_repl(&mut session).await
}
