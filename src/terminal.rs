use colored::{ColoredString, Colorize};
use ctxhelp_core::{HelpSurface, NoticeLevel, Notifier, StyledLine};
use std::io::{self, Write};
use tracing::warn;

/// Prints help documents with ANSI styling.
///
/// Font family and size have no terminal equivalent and are ignored.
pub struct TerminalSurface<W: Write> {
    out: W,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write(&mut self, window_title: &str, lines: &[StyledLine]) -> io::Result<()> {
        writeln!(self.out, "{}", window_title.bold().cyan())?;
        writeln!(self.out, "{}", "─".repeat(window_title.chars().count()).dimmed())?;
        for line in lines {
            writeln!(self.out, "{}", styled(line))?;
        }
        self.out.flush()
    }
}

impl<W: Write> HelpSurface for TerminalSurface<W> {
    fn show(&mut self, window_title: &str, lines: &[StyledLine]) {
        if let Err(e) = self.write(window_title, lines) {
            warn!("Failed to write help output: {}", e);
        }
    }
}

pub fn styled(line: &StyledLine) -> ColoredString {
    let style = line.style();
    let mut text = line.text().normal();
    if style.bold {
        text = text.bold();
    }
    if style.italic {
        text = text.italic();
    }
    if style.underline {
        text = text.underline();
    }
    if let Some((r, g, b)) = style.color.as_deref().and_then(parse_hex) {
        text = text.truecolor(r, g, b);
    }
    text
}

/// `#RRGGBB` or `RRGGBB` to its components
fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Notices go to stderr, tagged by level
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&mut self, level: NoticeLevel, title: &str, message: &str) {
        let label = match level {
            NoticeLevel::Info => title.blue().bold(),
            NoticeLevel::Warning => title.yellow().bold(),
            NoticeLevel::Error => title.red().bold(),
        };
        eprintln!("{}: {}", label, message);
    }
}
