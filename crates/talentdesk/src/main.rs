//! `TalentDesk` - terminal front-end for the priority inbox
//!
//! Loads the unified inbox, classifies email threads in the background and
//! prints the requested tab.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod command;
mod render;
mod settings;

use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use talentdesk_api::ApiClient;
use talentdesk_core::query::CacheEventKind;
use talentdesk_core::service::inbox_key;
use talentdesk_core::{InboxFilters, InboxService, InboxTab, select_thread};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use command::{Cli, Command, SettingsAction, ThreadsAction};
use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talentdesk=info,talentdesk_core=info,talentdesk_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = Cli::parse().into_command();

    let settings = Settings::load().await?;
    match command {
        Command::Settings { action: None } => {
            println!("# {}", Settings::path().display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Settings {
            action: Some(SettingsAction::Init),
        } => {
            let path = Settings::path();
            Settings::default().save_to(&path).await?;
            println!("Wrote defaults to {}", path.display());
        }
        command => {
            info!(api = %settings.api_base_url, "Starting TalentDesk");
            let client = ApiClient::with_timeout(&settings.api_base_url, settings.request_timeout())
                .context("invalid API base URL")?;
            let service = InboxService::new(client, settings.inbox_config())?;
            run(&service, command, settings.request_timeout()).await?;
        }
    }
    Ok(())
}

async fn run(service: &InboxService, command: Command, timeout: Duration) -> anyhow::Result<()> {
    match command {
        Command::Inbox(args) => {
            let tab = InboxTab::from(args.tab);
            let filters = args.filters();
            show_inbox(service, tab, &filters, timeout).await;
            if args.watch {
                watch_inbox(service, tab, &filters).await?;
            }
        }
        Command::Threads { action: None } => {
            let threads = service
                .list_threads()
                .await
                .map_err(|e| anyhow!(e.user_message("load smart threads")))?;
            print!("{}", render::threads(&threads, select_thread(&threads, None)));
        }
        Command::Threads {
            action: Some(ThreadsAction::Rebuild),
        } => {
            let threads = service
                .rebuild_threads()
                .await
                .map_err(|e| anyhow!(e.user_message("rebuild threads")))?;
            print!("{}", render::threads(&threads, select_thread(&threads, None)));
        }
        Command::Threads {
            action: Some(ThreadsAction::Show { id }),
        } => {
            let thread = service
                .get_thread(&id)
                .await
                .map_err(|e| anyhow!(e.user_message("load thread")))?;
            print!("{}", render::thread_detail(&thread));
        }
        Command::Classify { id } => {
            let result = service
                .classify_now(&id)
                .await
                .map_err(|e| anyhow!(e.user_message("classify thread")))?;
            print!("{}", render::classification(&id, &result));
        }
        Command::Settings { .. } => {}
    }
    Ok(())
}

/// Loads what `tab` needs and prints it.
async fn show_inbox(service: &InboxService, tab: InboxTab, filters: &InboxFilters, timeout: Duration) {
    let error = if tab == InboxTab::SmartCategories {
        service.load_categories().await.err().map(|e| e.user_message("load categories"))
    } else {
        let error = service.load_inbox().await.err().map(|e| e.user_message("load inbox"));
        wait_for_classifications(service, timeout).await;
        error
    };
    print!("{}", render::tab(tab, &service.view(tab, filters), error.as_deref()));
}

/// Waits until every watched thread has a result or an error, or `timeout`.
async fn wait_for_classifications(service: &InboxService, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let pending = service
            .watched_threads()
            .iter()
            .filter(|id| service.classifications().state(id).is_none_or(|s| s.result.is_none() && s.error.is_none()))
            .count();
        if pending == 0 || tokio::time::Instant::now() >= deadline {
            debug!(pending, "stopped waiting for classifications");
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Re-renders `tab` after every inbox refetch until Ctrl-C.
async fn watch_inbox(service: &InboxService, tab: InboxTab, filters: &InboxFilters) -> anyhow::Result<()> {
    let Some(_poll) = service.spawn_inbox_polling() else {
        println!("Inbox polling is disabled (inbox_refetch_secs = 0).");
        return Ok(());
    };
    let mut updates = service.queries().subscribe(&inbox_key());
    info!("Watching inbox, press Ctrl-C to stop");

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                return Ok(());
            }
            event = updates.next() => {
                let Some(event) = event else { return Ok(()) };
                if event.kind == CacheEventKind::Updated {
                    if let Some(inbox) = service.inbox_state().data {
                        service.watch_classifications(&inbox.inbox);
                    }
                }
                let error = service.inbox_state().error;
                print!("{}", render::tab(tab, &service.view(tab, filters), error.as_deref()));
            }
        }
    }
}
