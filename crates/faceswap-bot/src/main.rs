use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use faceswap_core::config::ConfigOverrides;
use faceswap_core::{ChatOutbound, FaceswapConfig, FaceswapError};
use faceswap_media::{HttpFetcher, ScriptTransformer, TempFileStore};
use faceswap_slack::{event_channel, SlackAdapter};
use tracing::{error, info, warn};

mod dispatch;

use dispatch::Dispatcher;

/// Slack bot that swaps the faces in images it is mentioned on.
#[derive(Parser, Debug)]
#[command(name = "faceswapbot", author, version, about, long_about = None)]
struct Args {
    /// Config file (default: ./faceswapbot.toml)
    #[arg(long, env = "FACESWAP_CONFIG")]
    config: Option<String>,

    /// Bot user OAuth token (xoxb-…)
    #[arg(long)]
    token: Option<String>,

    /// App-level token for Socket Mode (xapp-…)
    #[arg(long)]
    app_token: Option<String>,

    /// Face replacer script
    #[arg(long)]
    script: Option<String>,

    /// Interpreter for the script; pass "" to run the script directly
    #[arg(long)]
    interpreter: Option<String>,

    /// Directory of replacement faces
    #[arg(long)]
    faces: Option<String>,

    /// Directory of photobomb bodies
    #[arg(long)]
    bodies: Option<String>,

    /// Image used for the success effect
    #[arg(long)]
    success: Option<String>,

    /// Newline-delimited word list for upload file names
    #[arg(long)]
    words: Option<String>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            debug: self.debug.then_some(true),
            bot_token: self.token.clone(),
            app_token: self.app_token.clone(),
            interpreter: self.interpreter.clone(),
            script: self.script.clone(),
            faces_path: self.faces.clone(),
            bodies_path: self.bodies.clone(),
            success_path: self.success.clone(),
            word_list: self.words.clone(),
        }
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "faceswap=debug,info" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // config: --config / FACESWAP_CONFIG > ./faceswapbot.toml, then env, then flags
    let config = FaceswapConfig::load(args.config.as_deref(), &args.overrides())
        .context("invalid configuration")?;
    init_tracing(config.debug);
    for warning in config.path_warnings() {
        warning.log();
    }
    info!(version = env!("CARGO_PKG_VERSION"), "starting faceswapbot");

    let adapter = SlackAdapter::connect(&config.slack)
        .await
        .map_err(FaceswapError::from)?;
    let bot_user_id = adapter.bot_user_id().to_string();
    let outbound: Arc<dyn ChatOutbound> = Arc::new(adapter.outbound());

    let fetcher = Arc::new(HttpFetcher::new(
        config.slack.bot_token.clone(),
        Duration::from_secs(config.fetch.timeout_secs),
        config.fetch.max_download_bytes,
    )?);
    let transformer = Arc::new(ScriptTransformer::new(
        &config.transform,
        TempFileStore::new(config.scratch_dir.as_deref()),
    ));
    let dispatcher = Dispatcher::new(&config, bot_user_id, fetcher, transformer, outbound);

    let (events_tx, events_rx) = event_channel();
    let mut listener = tokio::spawn(adapter.run(events_tx));

    tokio::select! {
        res = dispatcher.run(events_rx) => {
            res?;
        }
        res = &mut listener => {
            match res {
                Ok(Ok(())) => warn!("socket mode listener exited"),
                Ok(Err(e)) => return Err(FaceswapError::from(e).into()),
                Err(e) => error!(error = %e, "socket mode listener panicked"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
        }
    }

    listener.abort();
    info!("shutdown complete");
    Ok(())
}
