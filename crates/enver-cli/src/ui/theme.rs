//! UI Theme - colors, icons and formatting helpers

use crossterm::style::Color;

#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: ColorScheme,
    pub icons: Icons,
}

/// Color scheme for UI elements
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Version strings (primary content)
    pub version: Color,
    /// Dates, sizes, changesets
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    /// LTS markers
    pub lts: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            version: Color::Cyan,
            secondary: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            lts: Color::Magenta,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Icons {
    pub active: &'static str,
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

/// Human readable byte size.
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

/// Sizes from the release API are signed; negative means unknown.
pub fn format_api_size(bytes: i64) -> String {
    u64::try_from(bytes).map_or_else(|_| "-".to_string(), format_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_format_api_size_negative() {
        assert_eq!(format_api_size(-1), "-");
        assert_eq!(format_api_size(512), "512 B");
    }
}
