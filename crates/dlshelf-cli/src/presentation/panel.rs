//! Panel table formatting.

use serde::Serialize;

use dlshelf_engine::PanelRow;

const NAME_WIDTH: usize = 28;
const STATE_WIDTH: usize = 15;

/// Serializable view of one panel row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PanelRowView {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub state: String,
    pub bytes_received: u64,
    pub total_bytes: Option<u64>,
    pub progress: Option<f64>,
    pub rate: f64,
    pub actions: Vec<String>,
}

impl From<&PanelRow> for PanelRowView {
    fn from(row: &PanelRow) -> Self {
        Self {
            id: row.record.id.get(),
            name: row.record.display_name().to_string(),
            url: row.record.url.clone(),
            state: row.state.to_string(),
            bytes_received: row.record.bytes_received,
            total_bytes: row.record.known_total(),
            progress: row.fraction(),
            rate: row.rate,
            actions: row.actions.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Print the panel as a table.
pub fn print_panel(rows: &[PanelRow]) {
    if rows.is_empty() {
        println!("(panel empty)");
        return;
    }

    println!(
        "{:<4} {:<name$} {:<state$} {:>20} {:>12}  ACTIONS",
        "ID",
        "NAME",
        "STATE",
        "PROGRESS",
        "RATE",
        name = NAME_WIDTH,
        state = STATE_WIDTH
    );
    print_separator(4 + NAME_WIDTH + STATE_WIDTH + 20 + 12 + 14);
    for row in rows {
        println!("{}", format_row(row));
    }
}

fn format_row(row: &PanelRow) -> String {
    let actions: Vec<&str> = row.actions.iter().map(|action| action.as_str()).collect();
    format!(
        "{:<4} {:<name$} {:<state$} {:>20} {:>12}  {}",
        row.record.id,
        truncate_string(row.record.display_name(), NAME_WIDTH),
        row.state.as_str(),
        format_progress(row),
        format_rate(row.rate),
        actions.join(","),
        name = NAME_WIDTH,
        state = STATE_WIDTH
    )
}

/// "received / total (pct)" or just the received bytes when the total is unknown.
fn format_progress(row: &PanelRow) -> String {
    let received = format_bytes(row.record.bytes_received);
    match (row.record.known_total(), row.fraction()) {
        (Some(total), Some(fraction)) => {
            format!("{received}/{} {:>3.0}%", format_bytes(total), fraction * 100.0)
        }
        _ => received,
    }
}

/// Human-readable byte count using binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Transfer rate in bytes per second, or a dash when idle.
pub fn format_rate(rate: f64) -> String {
    if rate <= 0.0 || !rate.is_finite() {
        return "-".to_string();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bytes = rate.round() as u64;
    format!("{}/s", format_bytes(bytes))
}

/// Truncate a string to a maximum length with ellipsis.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlshelf_core::{Action, DownloadRecord, IconBitmap, PresentationState};

    fn row(record: DownloadRecord, rate: f64) -> PanelRow {
        let state = PresentationState::of(&record);
        PanelRow {
            actions: state.available_actions().to_vec(),
            record,
            state,
            rate,
            icon: IconBitmap::placeholder(16),
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.0), "-");
        assert_eq!(format_rate(f64::NAN), "-");
        assert_eq!(format_rate(2048.0), "2.0 KiB/s");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a-very-long-file-name.iso", 10), "a-very-...");
    }

    #[test]
    fn test_row_view_from_running_download() {
        let record = DownloadRecord::new(7, "https://example.com/a.iso", "/dl/a.iso")
            .with_bytes(512, 1024);
        let view = PanelRowView::from(&row(record, 128.0));

        assert_eq!(view.id, 7);
        assert_eq!(view.name, "a.iso");
        assert_eq!(view.total_bytes, Some(1024));
        assert_eq!(view.progress, Some(0.5));
        assert_eq!(
            view.actions,
            vec![Action::Pause.to_string(), Action::Cancel.to_string()]
        );
    }

    #[test]
    fn test_unknown_total_shows_received_only() {
        let record = DownloadRecord::new(1, "https://example.com/live", "/dl/live")
            .with_bytes(2048, -1);
        let line = format_row(&row(record, 0.0));
        assert!(line.contains("2.0 KiB"));
        assert!(!line.contains('%'));
    }
}
