// Utils module - Utility functions

pub mod network;

use std::time::Duration;

/// Human-readable duration: "d days, h hours, m minutes"
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.as_secs() / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;
    format!("{} days, {} hours, {} minutes", days, hours, minutes)
}
