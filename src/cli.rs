use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

/// Mirrors archived Omnivore articles into Pinboard.
///
/// Credentials and behavior flags come from the environment
/// (`OMNIVORE_API`, `OMNIVORE_USERNAME`, `OMNIVORE_USER_ID`, `PINBOARD_API`,
/// `NOTIFICATION_EMAIL`, ...).
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP webhook receiver.
    Serve(ServeArgs),
    /// Handle a single webhook event and exit.
    Handle(HandleArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,
}

#[derive(Debug, Args)]
pub struct HandleArgs {
    /// Path to the event JSON (`-` reads stdin).
    #[arg(long, default_value = "-")]
    pub event: String,

    /// Input is a hosting envelope whose `body` field holds the webhook JSON.
    #[arg(long)]
    pub envelope: bool,
}
