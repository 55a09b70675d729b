mod action;
mod app;
mod cart;
mod config;
mod controller;
mod error;
mod event;
mod feed;
mod rest;
mod source;
mod tui;
mod types;
mod ui;

use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::feed::Feed;
use crate::rest::StoreApi;
use crate::tui::Tui;

/// Browse a storefront's cart, favourites, friends, payments and promotions
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Store API root, e.g. https://fakestoreapiserver.reactbd.org
    #[arg(long)]
    base_url: Option<String>,

    /// Open this feed instead of the profile menu
    #[arg(long, value_enum)]
    feed: Option<Feed>,

    /// Config file (defaults to <config dir>/storefront/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Log filter when `RUST_LOG` is unset. Logs share the terminal with the UI,
/// so only problems found before the UI starts should pass it.
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref());
    if let Some(base_url) = cli.base_url {
        config.general.base_url = base_url;
    }
    if cli.feed.is_some() {
        config.general.start_feed = cli.feed;
    }

    let api = StoreApi::new(&config.general.base_url, config.timeout())?;
    tracing::debug!(?api, "store client ready");

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    run(Arc::new(api), config).await
}

async fn run(api: Arc<StoreApi>, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut tui = Tui::new(Duration::from_millis(16))?; // ~60fps
    tui.enter()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut app = App::new(api, config, action_tx.clone());

    loop {
        tokio::select! {
            Some(event) = tui.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        tui.terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    Event::Resize(_, _) => {
                        tui.terminal.autoresize()?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    tui.exit()?;
    Ok(())
}
