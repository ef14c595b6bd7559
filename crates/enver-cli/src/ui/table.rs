//! Tabular listings built with comfy-table.

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use enver_schema::{ModuleRecord, ReleaseRecord, StreamKind, StreamSummary};

use super::theme::format_api_size;

fn base_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(h).fg(Color::DarkGrey)));
    table
}

fn stream_label(release: &ReleaseRecord) -> &'static str {
    match release.stream {
        Some(StreamKind::Lts) => "LTS",
        Some(StreamKind::Tech) => "Tech",
        Some(StreamKind::Beta) => "Beta",
        Some(StreamKind::Supported) => "Supported",
        None if release.is_lts => "LTS",
        None => "-",
    }
}

/// One row per release: version, stream, date, changeset, install state.
pub fn releases<'a>(rows: impl IntoIterator<Item = &'a ReleaseRecord>) -> Table {
    let mut table = base_table(&["VERSION", "STREAM", "RELEASED", "CHANGESET", "INSTALLED"]);
    for release in rows {
        let released = release
            .release_date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let installed = if release.installed {
            Cell::new("✓").fg(Color::Green)
        } else {
            Cell::new("")
        };
        let mut version = Cell::new(&release.version).fg(Color::Cyan);
        if release.security_alert.is_some() {
            version = Cell::new(format!("{} ⚠", release.version)).fg(Color::Yellow);
        }
        table.add_row(vec![
            version,
            Cell::new(stream_label(release)),
            Cell::new(released).fg(Color::DarkGrey),
            Cell::new(release.changeset.as_deref().unwrap_or("-")).fg(Color::DarkGrey),
            installed,
        ]);
    }
    table
}

/// One row per stream with its release count and newest version.
pub fn streams<'a>(rows: impl IntoIterator<Item = &'a StreamSummary>) -> Table {
    let mut table = base_table(&["STREAM", "RELEASES", "LATEST"]);
    for stream in rows {
        let name = if stream.is_lts {
            Cell::new(&stream.display_name).fg(Color::Magenta)
        } else {
            Cell::new(&stream.display_name)
        };
        table.add_row(vec![
            name,
            Cell::new(stream.total_count),
            Cell::new(&stream.latest_version).fg(Color::Cyan),
        ]);
    }
    table
}

/// Modules of one release. Hidden modules are omitted.
pub fn modules(release: &ReleaseRecord) -> Table {
    let mut table = base_table(&["ID", "NAME", "CATEGORY", "DOWNLOAD", "INSTALLED"]);
    let visible = release.modules.iter().filter(|m| !m.hidden);
    for module in visible {
        table.add_row(module_row(module, release.installed));
    }
    table
}

fn module_row(module: &ModuleRecord, release_installed: bool) -> Vec<Cell> {
    let installed = match (release_installed, module.installed) {
        (true, true) => Cell::new("✓").fg(Color::Green),
        (true, false) => Cell::new("missing").fg(Color::Yellow),
        (false, _) => Cell::new(""),
    };
    vec![
        Cell::new(&module.id).fg(Color::Cyan),
        Cell::new(&module.name),
        Cell::new(format!("{:?}", module.category)).fg(Color::DarkGrey),
        Cell::new(format_api_size(module.download_size)).fg(Color::DarkGrey),
        installed,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_table_renders_rows() {
        let mut lts = ReleaseRecord::new("2022.3.60f1");
        lts.stream = Some(StreamKind::Lts);
        lts.changeset = Some("b2e806cf271c".into());
        lts.installed = true;
        let beta = ReleaseRecord::new("6000.4.0b6");

        let rendered = releases([&lts, &beta]).to_string();
        assert!(rendered.contains("2022.3.60f1"));
        assert!(rendered.contains("b2e806cf271c"));
        assert!(rendered.contains("6000.4.0b6"));
        assert!(rendered.contains("LTS"));
    }

    #[test]
    fn test_stream_label_falls_back_to_lts_flag() {
        let mut record = ReleaseRecord::new("2021.3.45f1");
        assert_eq!(stream_label(&record), "-");
        record.is_lts = true;
        assert_eq!(stream_label(&record), "LTS");
    }
}
