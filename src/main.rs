use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;
use tokio::io::AsyncReadExt as _;

use omnivore_pinboard::cli::{Cli, Command, HandleArgs};
use omnivore_pinboard::config::Config;
use omnivore_pinboard::event;
use omnivore_pinboard::handler::Handler;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    omnivore_pinboard::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let config = Config::from_env().context("load config")?;
    tracing::debug!(?config, "loaded config");
    let handler = Handler::from_config(&config).context("build handler")?;

    match cli.command {
        Command::Serve(args) => {
            omnivore_pinboard::server::serve(args.addr, Arc::new(handler))
                .await
                .context("serve")?;
        }
        Command::Handle(args) => {
            handle_once(&handler, &args).await.context("handle")?;
        }
    }

    Ok(())
}

async fn handle_once(handler: &Handler, args: &HandleArgs) -> anyhow::Result<()> {
    let raw = if args.event == "-" {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("read event from stdin")?;
        raw
    } else {
        tokio::fs::read_to_string(&args.event)
            .await
            .with_context(|| format!("read event: {}", args.event))?
    };

    let body = if args.envelope {
        event::unwrap_envelope(&raw)?
    } else {
        raw
    };

    let outcome = handler.handle_body(&body).await?;
    tracing::info!(%outcome, "event handled");
    Ok(())
}
