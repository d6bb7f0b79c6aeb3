/// file: src/ui.rs
/// description: ui presentation layer that handles monitor events from the channels
use crate::{
    events::{EventReceiver, MonitorEvent},
    formatter::{Colors, OutputFormat, UpdateFormatter},
};
use tracing::info;

pub struct UiController {
    event_receiver: EventReceiver,
    formatter: UpdateFormatter,
    quiet_mode: bool,
    header_printed: bool,
    max_events: Option<u64>,
    entity_updates: u64,
    can_frames: u64,
    started_at: std::time::Instant,
}

pub struct UiOptions {
    pub colored: bool,
    pub quiet: bool,
    pub csv_export: bool,
    pub max_events: u64,
}

impl UiController {
    pub fn new(event_receiver: EventReceiver, format: OutputFormat, options: UiOptions) -> Self {
        Self {
            event_receiver,
            formatter: UpdateFormatter::new(
                format,
                options.colored,
                options.quiet,
                options.csv_export,
            ),
            quiet_mode: options.quiet,
            header_printed: false,
            max_events: if options.max_events == 0 {
                None
            } else {
                Some(options.max_events)
            },
            entity_updates: 0,
            can_frames: 0,
            started_at: std::time::Instant::now(),
        }
    }

    pub async fn run(&mut self) {
        self.print_startup_banner();
        while let Some(event) = self.event_receiver.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        self.formatter.print_summary(
            self.entity_updates,
            self.can_frames,
            self.started_at.elapsed().as_secs(),
        );
    }

    fn handle_event(&mut self, event: MonitorEvent) -> bool {
        match event {
            MonitorEvent::Starting => {
                info!("Monitor starting...");
            }
            MonitorEvent::ChannelConnecting { channel, url } => {
                self.formatter
                    .print_status("CONNECTING", &format!("{} -> {}", channel, url));
            }
            MonitorEvent::ChannelConnected { channel } => {
                self.formatter.print_status("CONNECTED", &channel);
                if !self.header_printed {
                    self.formatter.print_header();
                    self.header_printed = true;
                }
            }
            MonitorEvent::ChannelClosed { channel, close } => {
                let detail = match close {
                    Some(info) => format!("{} (code {}: {})", channel, info.code, info.reason),
                    None => channel,
                };
                self.formatter.print_status("DISCONNECTED", &detail);
            }
            MonitorEvent::ChannelError { channel, error } => {
                self.formatter
                    .print_status("ERROR", &format!("{}: {}", channel, error));
            }
            MonitorEvent::EntityUpdated(update) => {
                // Ensure header is printed before any rows (fallback safety)
                if !self.header_printed {
                    self.formatter.print_header();
                    self.header_printed = true;
                }
                self.entity_updates += 1;
                self.formatter.print_entity(&update);

                if self.reached_max_events() {
                    return false;
                }
            }
            MonitorEvent::CanFrameSeen(frame) => {
                self.can_frames += 1;
                self.formatter.print_can_frame(&frame);

                if self.reached_max_events() {
                    return false;
                }
            }
            MonitorEvent::StatusReport(status) => {
                self.formatter.print_status_report(&status);
            }
            MonitorEvent::UnknownMessage { channel, kind } => {
                info!(channel = %channel, kind = %kind, "unrecognized message kind");
            }
            MonitorEvent::Stopping => {
                self.formatter.print_status("STOPPING", "Monitor shutting down");
                return false;
            }
        }

        true
    }

    fn reached_max_events(&self) -> bool {
        if let Some(max_events) = self.max_events {
            if self.entity_updates + self.can_frames >= max_events {
                self.formatter.print_status(
                    "STOPPING",
                    &format!("Reached configured max events ({max_events})"),
                );
                return true;
            }
        }
        false
    }

    fn print_startup_banner(&self) {
        if self.quiet_mode {
            return;
        }

        println!();
        println!(
            "{}{}╔══════════════════════════════════════════════════════════════╗{}",
            Colors::BOLD,
            Colors::BRIGHT_CYAN,
            Colors::RESET
        );
        println!(
            "{}{}║                 COACHIQ RV-C TELEMETRY MONITOR               ║{}",
            Colors::BOLD,
            Colors::BRIGHT_CYAN,
            Colors::RESET
        );
        println!(
            "{}{}║{}  Version: {}{:<8}{}                                          {}║{}",
            Colors::BOLD,
            Colors::BRIGHT_CYAN,
            Colors::RESET,
            Colors::BRIGHT_GREEN,
            env!("CARGO_PKG_VERSION"),
            Colors::RESET,
            Colors::BRIGHT_CYAN,
            Colors::RESET
        );
        println!(
            "{}{}╚══════════════════════════════════════════════════════════════╝{}",
            Colors::BOLD,
            Colors::BRIGHT_CYAN,
            Colors::RESET
        );
        println!();
    }
}
