//! Pretty output formatting.

use crate::tables::TableSummary;

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[38;2;158;206;106m"; // #9ece6a
const YELLOW: &str = "\x1b[38;2;224;175;104m"; // #e0af68
const RED: &str = "\x1b[38;2;247;118;142m"; // #f7768e

/// Colors a table status: green when usable, yellow while changing.
pub fn format_status(status: &str) -> String {
    let color = match status {
        "ACTIVE" => GREEN,
        "CREATING" | "UPDATING" => YELLOW,
        _ => RED,
    };
    format!("{}{}{}", color, status, RESET)
}

/// Format table names for display.
pub fn format_table_names(names: &[String]) -> String {
    if names.is_empty() {
        return "No tables found.".to_string();
    }
    let mut output = format!("TABLES ({})\n", names.len());
    output.push_str(&"-".repeat(40));
    for name in names {
        output.push_str(&format!("\n{}", name));
    }
    output
}

/// Format a table summary for display.
pub fn format_table_summary(summary: &TableSummary) -> String {
    let mut output = format!(
        "{}\n  Status: {}",
        summary.name,
        format_status(&summary.status)
    );
    if let Some(count) = summary.item_count {
        output.push_str(&format!("\n  Items: {}", count));
    }
    output
}
