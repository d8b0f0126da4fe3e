//! AnsPress AJAX server.
//!
//! Serves the Q&A actions over HTTP:
//! - `GET|POST /ajax?action=ap_<name>` runs an action
//! - `GET /nonce?key=<key>` mints a nonce for the caller
//! - `GET /actions` lists registered actions
//!
//! The caller is taken from the `x-ap-user: user:<id>` header.
//!
//! Run:
//!   cargo run -p anspress-ajax-server -- --nonce-secret dev-secret
//!
//! Then:
//!   curl 'localhost:8080/ajax?action=ap_ping'
//!   curl -H 'x-ap-user: user:2' 'localhost:8080/nonce'
//!   curl -H 'x-ap-user: user:2' -d "__nonce=<nonce>&post_id=1&comment=Great+question" \
//!     'localhost:8080/ajax?action=ap_postcomment'

mod actions;
mod board;
mod config;
mod server;

use board::{Board, PostKind};
use clap::Parser;
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "anspress-ajax", version, about = "Serve AnsPress AJAX actions over HTTP")]
struct Cli {
    /// TOML config file.
    #[arg(long, env = "ANSPRESS_AJAX_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind, overrides the config file.
    #[arg(long, env = "ANSPRESS_AJAX_LISTEN")]
    listen: Option<String>,

    /// Secret used to sign nonces, overrides the config file.
    #[arg(long, env = "ANSPRESS_AJAX_NONCE_SECRET", hide_env_values = true)]
    nonce_secret: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("anspress_ajax_server=info".parse()?)
                .add_directive("anspress_ajax_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(secret) = cli.nonce_secret {
        config.nonce.secret = secret;
    }

    let mut board = Board::new();
    let question = board.add_post(PostKind::Question, 1, "How do AnsPress nonces expire?");
    board.add_post(PostKind::Answer, 2, "They are valid for two ticks.");
    tracing::info!(question, "seeded board");

    server::run(config, board.shared()).await
}
