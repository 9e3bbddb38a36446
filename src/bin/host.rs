//! Headless reminder host reading commands from stdin.
//!
//! Each input line is `<chat-id> /command args...`; the chat id may be
//! omitted and defaults to 0, which is handy for single-user runs.
//! Replies and deliveries go to stdout, tracing goes to stderr so
//! stdout stays a clean reply channel.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use cuckoo::{
    CommandRouter, ConsoleTransport, DispatchTimer, EventRegistry, Notifier, ReminderConfig,
    SledStore,
};

struct Args {
    config_path: Option<std::path::PathBuf>,
    store_path: Option<std::path::PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config_path: None,
        store_path: None,
    };
    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--config" => {
                let value = argv
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config needs a path"))?;
                args.config_path = Some(value.into());
            }
            "--store" => {
                let value = argv
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--store needs a path"))?;
                args.store_path = Some(value.into());
            }
            other => anyhow::bail!("unknown argument '{other}' (expected --config / --store)"),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing to stderr only; stdout carries replies and deliveries.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;

    let mut config = match &args.config_path {
        Some(path) => ReminderConfig::from_file(path)?,
        None => {
            let default_path = ReminderConfig::default_config_path();
            if default_path.exists() {
                ReminderConfig::from_file(&default_path)?
            } else {
                ReminderConfig::default()
            }
        }
    };
    if let Some(store_path) = args.store_path {
        config.store.path = store_path;
    }

    tracing::info!("opening store at {}", config.store.path.display());
    let store = Arc::new(SledStore::open(&config.store.path)?);

    let notifier = Arc::new(Notifier::new(Arc::new(ConsoleTransport)));
    let registry = Arc::new(EventRegistry::new(store.clone()));
    let router = CommandRouter::new(registry, notifier.clone());

    let timer = DispatchTimer::new(store, notifier).with_tick_secs(config.dispatch.tick_secs);
    let _dispatch = timer.run();

    tracing::info!("cuckoo ready, reading commands from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (chat_id, command) = split_chat_prefix(line);
        let reply = router.handle(chat_id, command);
        println!("{reply}");
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Split an optional leading chat id off a command line.
fn split_chat_prefix(line: &str) -> (i64, &str) {
    if let Some((head, rest)) = line.split_once(' ')
        && let Ok(chat_id) = head.parse::<i64>()
    {
        return (chat_id, rest.trim_start());
    }
    (0, line)
}
