// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `contactd serve`, `contactd migrate` and `contactd check-config`.

use std::sync::Arc;

use std::io::BufRead;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use contactd_bus::{Envelope, EventBus, InboundMessage, InboundRouter};
use contactd_config::ContactdConfig;
use contactd_core::ContactdError;
use contactd_service::ContactService;
use contactd_storage::{Database, SqliteContactStore};

use crate::shutdown;

/// Everything `serve` runs, built leaves first.
struct App {
    db: Arc<Database>,
    bus: EventBus,
    contacts: Arc<ContactService>,
    router: InboundRouter,
}

/// Wire storage, the event bus, the contact service and the inbound router.
async fn assemble(config: &ContactdConfig) -> Result<App, ContactdError> {
    let db = Arc::new(Database::open_with(&config.storage).await?);

    let bus = EventBus::new(config.bus.capacity);
    let contacts = Arc::new(ContactService::from_config(
        &config.bus,
        Arc::new(SqliteContactStore::new(Arc::clone(&db))),
        Arc::new(bus.clone()),
    ));
    let router = InboundRouter::from_config(&config.bus, contacts.clone());

    Ok(App {
        db,
        bus,
        contacts,
        router,
    })
}

/// Runs the `contactd serve` command until a shutdown signal arrives.
pub async fn run_serve(config: ContactdConfig) -> Result<(), ContactdError> {
    init_tracing(&config.service.log_level);
    info!(service = %config.service.name, "starting contactd serve");

    let App {
        db,
        bus,
        contacts,
        router,
    } = assemble(&config).await?;

    let cancel = shutdown::install_signal_handler();

    let event_log = tokio::spawn(log_events(bus.subscribe(), cancel.clone()));

    let (inbound, inbound_rx) = mpsc::channel::<InboundMessage>(config.bus.capacity);
    let router_task = tokio::spawn(router.run(inbound_rx, cancel.clone()));
    spawn_stdin_feed(inbound);

    info!(
        exchange = %config.bus.exchange,
        queue = %config.bus.domain_deleted_queue,
        "contactd ready"
    );
    cancel.cancelled().await;

    match router_task.await {
        Ok(stats) => info!(handled = stats.handled, rejected = stats.rejected, "inbound router drained"),
        Err(e) => warn!(error = %e, "inbound router task failed"),
    }
    if let Err(e) = event_log.await {
        warn!(error = %e, "event log task failed");
    }

    drop(contacts);
    db.checkpoint().await?;
    info!("contactd serve shutdown complete");
    Ok(())
}

/// Runs the `contactd migrate` command.
pub async fn run_migrate(config: ContactdConfig) -> Result<(), ContactdError> {
    init_tracing(&config.service.log_level);
    let db = Database::open_with(&config.storage).await?;
    db.close().await?;
    println!(
        "contactd: database at {} is up to date",
        config.storage.database_path
    );
    Ok(())
}

/// Runs the `contactd check-config` command.
pub fn print_config(config: &ContactdConfig) -> Result<(), ContactdError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ContactdError::Config(format!("cannot render configuration: {e}")))?;
    println!("# configuration is valid\n{rendered}");
    Ok(())
}

/// Parses one `<topic> <payload>` line. Blank lines yield nothing;
/// malformed lines are logged and skipped.
fn parse_inbound_line(line: &str) -> Option<InboundMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((topic, payload)) => Some(InboundMessage::new(topic, payload.trim_start())),
        None => {
            warn!(line, "inbound line is not `<topic> <payload>`, skipped");
            None
        }
    }
}

/// Forwards parsed lines to the inbound router until the input ends or the
/// router goes away. Blocking; returns the number of messages forwarded.
fn feed_lines<R: BufRead>(input: R, sender: &mpsc::Sender<InboundMessage>) -> usize {
    let mut forwarded = 0;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "inbound feed read failed");
                break;
            }
        };
        if let Some(message) = parse_inbound_line(&line) {
            if sender.blocking_send(message).is_err() {
                break;
            }
            forwarded += 1;
        }
    }
    forwarded
}

/// Pipes stdin into the inbound router, so a broker consumer (or an
/// operator) can deliver integration events to `serve`.
///
/// Runs on its own thread: a blocking stdin read cannot be cancelled and
/// must not hold up runtime shutdown.
fn spawn_stdin_feed(sender: mpsc::Sender<InboundMessage>) {
    let spawned = std::thread::Builder::new()
        .name("inbound-stdin".to_string())
        .spawn(move || {
            let forwarded = feed_lines(std::io::stdin().lock(), &sender);
            debug!(forwarded, "inbound feed closed");
        });
    if let Err(e) = spawned {
        warn!(error = %e, "cannot start inbound feed, router will stay idle");
    }
}

/// Logs every event published on the bus until shutdown.
async fn log_events(mut events: broadcast::Receiver<Arc<Envelope>>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = events.recv() => match received {
                Ok(envelope) => debug!(
                    topic = envelope.topic,
                    contact_id = %envelope.entity_id,
                    message_id = %envelope.id,
                    "domain event published"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event log fell behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("contactd={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
