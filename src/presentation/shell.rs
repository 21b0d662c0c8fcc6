// Root chrome shared by every view
use std::fmt::Write;

pub const APP_TITLE: &str = "GasMonitor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    SensorList,
    SensorDetail,
    SensorHistory,
}

impl Page {
    /// Every page lives under the "Sensors" navigation entry
    fn nav_section(&self) -> &'static str {
        "Sensors"
    }
}

pub fn render_shell(page: Page, body: &str) -> String {
    let header = format!("{}  |  [{}]", APP_TITLE, page.nav_section());

    let mut out = String::new();
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{}", "=".repeat(header.chars().count()));
    let _ = writeln!(out);
    out.push_str(body);
    out
}

/// ANSI sequence that clears the terminal and homes the cursor, used between
/// re-renders of the live view
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
