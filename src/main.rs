use anyhow::Result;
use clap::Parser;
use coachiq_ws::{
    channels::ChannelSet,
    cli::Args,
    config::Config,
    connection::ConnectionManager,
    events::{create_event_channel, EventSender, MonitorEvent},
    formatter::OutputFormat,
    handlers::ChannelHandlers,
    monitoring::{setup_metrics, HealthReport},
    tracing_setup::setup_tracing,
    transport::WsTransport,
    ui::{UiController, UiOptions},
};
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_tracing(&args.log_level, args.json_logs)?;

    info!(
        "Starting CoachIQ telemetry monitor v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_args(&args)?;

    if config.metrics.enabled {
        setup_metrics(config.metrics.port).await?;
        info!("Metrics server started on port {}", config.metrics.port);
    }

    let (event_tx, event_rx) = create_event_channel();

    let channels = ChannelSet::from_config(&config)?;
    for channel in channels.iter() {
        register_monitor_handlers(channel, event_tx.clone(), config.logging.verbose_frames).await;
        let _ = event_tx
            .send(MonitorEvent::ChannelConnecting {
                channel: channel.name().to_string(),
                url: channel.url().to_string(),
            })
            .await;
    }

    let mut ui = UiController::new(
        event_rx,
        OutputFormat::from(args.format.as_str()),
        UiOptions {
            colored: !args.no_color,
            quiet: args.quiet,
            csv_export: args.csv_export,
            max_events: args.max_events,
        },
    );
    let mut ui_task = tokio::spawn(async move { ui.run().await });

    let _ = event_tx.send(MonitorEvent::Starting).await;
    channels.connect_all().await;

    let health_task = spawn_health_logger(&channels, config.health.check_interval);

    info!("Monitor started. Press Ctrl+C to shutdown...");
    let ui_finished = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            false
        }
        // UI ends on its own when it hits the max-events cap.
        _ = &mut ui_task => true,
    };

    health_task.abort();
    channels.disconnect_all().await;
    let _ = event_tx.send(MonitorEvent::Stopping).await;
    drop(event_tx);
    if !ui_finished {
        let _ = ui_task.await;
    }

    info!("Monitor stopped");
    Ok(())
}

/// Wire one channel's callbacks to the UI event bus. Callbacks run on the
/// connection task, so they must not block: events are shed with try_send
/// when the UI falls behind rather than stalling the socket.
async fn register_monitor_handlers<T: WsTransport>(
    channel: &ConnectionManager<T>,
    events: EventSender,
    verbose_frames: bool,
) {
    let name = channel.name().to_string();

    let handlers = ChannelHandlers::new()
        .on_message({
            let events = events.clone();
            let name = name.clone();
            move |message| {
                if verbose_frames {
                    info!(channel = %name, kind = %message.kind(), "frame received");
                }
                if let coachiq_ws::types::InboundMessage::Unknown { kind, .. } = message {
                    let _ = events.try_send(MonitorEvent::UnknownMessage {
                        channel: name.clone(),
                        kind: kind.clone(),
                    });
                }
            }
        })
        .on_entity_update({
            let events = events.clone();
            move |update| {
                if events
                    .try_send(MonitorEvent::EntityUpdated(update.clone()))
                    .is_err()
                {
                    warn!("event bus full, dropping entity update");
                }
            }
        })
        .on_can_message({
            let events = events.clone();
            move |frame| {
                // Sniffer frames are shed silently under backpressure.
                let _ = events.try_send(MonitorEvent::CanFrameSeen(frame.clone()));
            }
        })
        .on_system_status({
            let events = events.clone();
            move |status| {
                let _ = events.try_send(MonitorEvent::StatusReport(status.clone()));
            }
        })
        .on_open({
            let events = events.clone();
            let name = name.clone();
            move || {
                let _ = events.try_send(MonitorEvent::ChannelConnected {
                    channel: name.clone(),
                });
            }
        })
        .on_close({
            let events = events.clone();
            let name = name.clone();
            move |close| {
                let _ = events.try_send(MonitorEvent::ChannelClosed {
                    channel: name.clone(),
                    close: close.cloned(),
                });
            }
        })
        .on_error({
            let events = events.clone();
            let name = name.clone();
            move |error| {
                let _ = events.try_send(MonitorEvent::ChannelError {
                    channel: name.clone(),
                    error: error.to_string(),
                });
            }
        });

    channel.update_handlers(handlers).await;
}

/// Log a per-channel health report on a fixed cadence.
fn spawn_health_logger<T: WsTransport>(
    channels: &ChannelSet<T>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    let watched: Vec<_> = channels
        .iter()
        .map(|c| (c.name().to_string(), c.state_handle()))
        .collect();

    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        timer.tick().await; // first tick is immediate, skip it
        loop {
            timer.tick().await;
            for (name, state) in &watched {
                let stats = coachiq_ws::state::ChannelStats::from(&*state.lock().await);
                let report = HealthReport::from_stats(name, &stats);
                info!(health = %report.to_json(), "channel health");
            }
        }
    })
}
