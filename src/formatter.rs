use crate::types::{CanFrame, EntityUpdate, SystemStatus};

// ANSI color codes
pub struct Colors;

impl Colors {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";

    // Colors
    pub const RED: &'static str = "\x1b[31m";
    pub const GREEN: &'static str = "\x1b[32m";
    pub const YELLOW: &'static str = "\x1b[33m";
    pub const WHITE: &'static str = "\x1b[37m";
    pub const GRAY: &'static str = "\x1b[90m";

    // Bright colors
    pub const BRIGHT_RED: &'static str = "\x1b[91m";
    pub const BRIGHT_GREEN: &'static str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &'static str = "\x1b[93m";
    pub const BRIGHT_BLUE: &'static str = "\x1b[94m";
    pub const BRIGHT_MAGENTA: &'static str = "\x1b[95m";
    pub const BRIGHT_CYAN: &'static str = "\x1b[96m";
    pub const BRIGHT_WHITE: &'static str = "\x1b[97m";
}

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
    Minimal,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "csv" => OutputFormat::Csv,
            "json" => OutputFormat::Json,
            "minimal" => OutputFormat::Minimal,
            _ => OutputFormat::Table,
        }
    }
}

pub struct UpdateFormatter {
    format: OutputFormat,
    colored: bool,
    quiet: bool,
    csv_export: bool,
    row_count: u64,
}

impl UpdateFormatter {
    pub fn new(format: OutputFormat, colored: bool, quiet: bool, csv_export: bool) -> Self {
        Self {
            format,
            colored,
            quiet,
            csv_export,
            row_count: 0,
        }
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn print_header(&self) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Table => self.print_table_header(),
            OutputFormat::Csv => self.print_csv_header(),
            OutputFormat::Json => {}    // JSON doesn't need headers
            OutputFormat::Minimal => {} // Minimal doesn't need headers
        }
    }

    pub fn print_entity(&mut self, update: &EntityUpdate) {
        self.row_count += 1;

        match self.format {
            OutputFormat::Table => self.print_table_row(update),
            OutputFormat::Csv => self.print_csv_row(update),
            OutputFormat::Json => self.print_json_row(update),
            OutputFormat::Minimal => self.print_minimal_row(update),
        }

        // Export to CSV on stderr if enabled
        if self.csv_export {
            self.export_csv_to_stderr(update);
        }
    }

    fn print_table_header(&self) {
        let top = "┌─────────┬──────────────────────────┬────────────┬────────────┬────────────┬──────────┐";
        let sep = "├─────────┼──────────────────────────┼────────────┼────────────┼────────────┼──────────┤";
        let labels = format!(
            "│ {:<7} │ {:<24} │ {:<10} │ {:<10} │ {:<10} │ {:<8} │",
            "COUNT", "ENTITY", "TYPE", "AREA", "STATE", "TIME"
        );

        if self.colored {
            println!("{}{}{}{}", Colors::BOLD, Colors::GRAY, top, Colors::RESET);
            println!("{}{}{}{}", Colors::BOLD, Colors::WHITE, labels, Colors::RESET);
            println!("{}{}{}{}", Colors::BOLD, Colors::GRAY, sep, Colors::RESET);
        } else {
            println!("{}", top);
            println!("{}", labels);
            println!("{}", sep);
        }
    }

    fn print_csv_header(&self) {
        println!("count,entity_id,device_type,area,state,local_time,unix_timestamp");
    }

    fn print_table_row(&self, update: &EntityUpdate) {
        let state_color = if self.colored {
            if update.is_on() {
                Colors::BRIGHT_GREEN
            } else {
                Colors::GRAY
            }
        } else {
            ""
        };
        let reset = if self.colored { Colors::RESET } else { "" };
        let gray = if self.colored { Colors::GRAY } else { "" };

        println!(
            "{}│{} {:<7} {}│{} {:<24} {}│{} {:<10} {}│{} {:<10} {}│{} {}{:<10}{} {}│{} {:<8} {}│{}",
            gray,
            reset,
            self.row_count,
            gray,
            reset,
            truncate(update.display_name(), 24),
            gray,
            reset,
            truncate(&update.device_type, 10),
            gray,
            reset,
            truncate(update.suggested_area.as_deref().unwrap_or("-"), 10),
            gray,
            reset,
            state_color,
            truncate(&update.state, 10),
            reset,
            gray,
            reset,
            update.datetime_local().format("%H:%M:%S"),
            gray,
            reset
        );
    }

    fn print_csv_row(&self, update: &EntityUpdate) {
        println!(
            "{},{},{},{},{},{},{}",
            self.row_count,
            update.entity_id,
            update.device_type,
            update.suggested_area.as_deref().unwrap_or(""),
            update.state,
            update.datetime_local().format("%Y-%m-%d %H:%M:%S"),
            update.timestamp
        );
    }

    fn print_json_row(&self, update: &EntityUpdate) {
        let json_obj = serde_json::json!({
            "count": self.row_count,
            "entity_id": update.entity_id,
            "name": update.display_name(),
            "device_type": update.device_type,
            "area": update.suggested_area,
            "state": update.state,
            "raw": update.raw,
            "local_time": update.datetime_local().format("%Y-%m-%d %H:%M:%S").to_string(),
            "unix_timestamp": update.timestamp
        });

        println!("{}", serde_json::to_string(&json_obj).unwrap_or_default());
    }

    fn print_minimal_row(&self, update: &EntityUpdate) {
        let state_color = if self.colored {
            if update.is_on() {
                Colors::BRIGHT_GREEN
            } else {
                Colors::GRAY
            }
        } else {
            ""
        };
        let reset = if self.colored { Colors::RESET } else { "" };

        println!(
            "{} {}{:<10}{} {}",
            update.datetime_local().format("%H:%M:%S"),
            state_color,
            update.state,
            reset,
            update.display_name()
        );
    }

    fn export_csv_to_stderr(&self, update: &EntityUpdate) {
        eprintln!(
            "{},{},{},{},{},{},{}",
            self.row_count,
            update.entity_id,
            update.device_type,
            update.suggested_area.as_deref().unwrap_or(""),
            update.state,
            update.datetime_local().format("%Y-%m-%d %H:%M:%S"),
            update.timestamp
        );
    }

    pub fn print_can_frame(&mut self, frame: &CanFrame) {
        self.row_count += 1;
        if self.quiet {
            return;
        }

        let gray = if self.colored { Colors::GRAY } else { "" };
        let cyan = if self.colored { Colors::BRIGHT_CYAN } else { "" };
        let yellow = if self.colored { Colors::BRIGHT_YELLOW } else { "" };
        let reset = if self.colored { Colors::RESET } else { "" };

        println!(
            "{} {}{}{} {}{:08X}{} {}{:<6}{} {}{}{}",
            frame.datetime_local().format("%H:%M:%S%.3f"),
            gray,
            frame.interface,
            reset,
            cyan,
            frame.arbitration_id,
            reset,
            yellow,
            frame.dgn.as_deref().unwrap_or("-"),
            reset,
            Colors::DIM,
            frame.data,
            reset
        );
    }

    pub fn print_status_report(&self, status: &SystemStatus) {
        if self.quiet {
            return;
        }

        let header_color = if status.is_healthy() {
            Colors::BRIGHT_GREEN
        } else {
            Colors::BRIGHT_RED
        };

        let mut output = format!(
            "{}{}[SYSTEM]{} {} | v{} | up {}s | {} entities\n",
            Colors::BOLD,
            header_color,
            Colors::RESET,
            status.status,
            status.version.as_deref().unwrap_or("?"),
            status.uptime_seconds,
            status.entity_count
        );

        for interface in &status.interfaces {
            output.push_str(&format!(
                "  {}{:>6}{}: rx {}{}{} tx {}{}{} ({})\n",
                Colors::BRIGHT_YELLOW,
                interface.name,
                Colors::RESET,
                Colors::BRIGHT_WHITE,
                interface.rx_frames,
                Colors::RESET,
                Colors::BRIGHT_WHITE,
                interface.tx_frames,
                Colors::RESET,
                interface.bus_state
            ));
        }

        print!("{}", output);
    }

    pub fn print_status(&self, status: &str, message: &str) {
        if self.quiet && status != "ERROR" {
            return;
        }

        let symbol = match status {
            "CONNECTING" => "*",
            "CONNECTED" => "+",
            "LISTENING" => "~",
            "DISCONNECTED" => "X",
            "STOPPING" => "!",
            "ERROR" => "!",
            _ => "-",
        };

        let color = if self.colored {
            match status {
                "CONNECTING" => Colors::BRIGHT_YELLOW,
                "CONNECTED" => Colors::BRIGHT_GREEN,
                "LISTENING" => Colors::BRIGHT_BLUE,
                "DISCONNECTED" => Colors::BRIGHT_RED,
                "STOPPING" => Colors::BRIGHT_MAGENTA,
                "ERROR" => Colors::BRIGHT_RED,
                _ => Colors::WHITE,
            }
        } else {
            ""
        };
        let reset = if self.colored { Colors::RESET } else { "" };

        println!(
            "{}{}[{}]{} {} {}",
            Colors::BOLD,
            color,
            status,
            reset,
            symbol,
            message
        );
    }

    pub fn print_summary(&self, entity_updates: u64, can_frames: u64, duration_secs: u64) {
        if self.quiet {
            return;
        }

        let rate = if duration_secs > 0 {
            (entity_updates + can_frames) as f64 / duration_secs as f64
        } else {
            0.0
        };

        println!();
        if self.colored {
            println!(
                "{}{}Summary: {} entity updates, {} CAN frames in {}s ({:.2} msgs/sec){}",
                Colors::BOLD,
                Colors::BRIGHT_CYAN,
                entity_updates,
                can_frames,
                duration_secs,
                rate,
                Colors::RESET
            );
        } else {
            println!(
                "Summary: {} entity updates, {} CAN frames in {}s ({:.2} msgs/sec)",
                entity_updates, can_frames, duration_secs, rate
            );
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_preserves_short_strings() {
        assert_eq!(truncate("tank", 10), "tank");
        assert_eq!(truncate("bedroom ceiling light", 10), "bedroom c…");
    }
}
