use crate::catalog::{HelpCatalog, HelpContent};
use crate::document::{AnnotatedDocument, StyledLine};
use ctxhelp_common::Result;
use std::path::Path;
use tracing::debug;

pub const NO_HELP_MESSAGE: &str = "No help available for this element.";
pub const GENERAL_HELP_TITLE: &str = "General Help";

/// Reports which widget currently has keyboard focus
pub trait FocusSource {
    fn focused_identifier(&self) -> Option<String>;
}

/// Somewhere styled help text can be displayed
pub trait HelpSurface {
    fn show(&mut self, window_title: &str, lines: &[StyledLine]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Simple modal notifications
pub trait Notifier {
    fn notify(&mut self, level: NoticeLevel, title: &str, message: &str);
}

/// Serves help lookups from a loaded catalog.
///
/// The catalog is read-only for the lifetime of the viewer.
#[derive(Debug, Clone, Default)]
pub struct ContextualHelp {
    catalog: HelpCatalog,
}

impl ContextualHelp {
    pub fn new(catalog: HelpCatalog) -> Self {
        Self { catalog }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(HelpCatalog::load_path(path)?))
    }

    pub fn catalog(&self) -> &HelpCatalog {
        &self.catalog
    }

    pub fn lookup(&self, identifier: &str) -> HelpContent<'_> {
        self.catalog.lookup(identifier)
    }

    /// Show help for one element, or a notice when there is none.
    /// Returns whether help was shown.
    pub fn display_help(
        &self,
        identifier: &str,
        surface: &mut dyn HelpSurface,
        notifier: &mut dyn Notifier,
    ) -> bool {
        match self.lookup(identifier) {
            HelpContent::Found(document) => {
                surface.show(&window_title(identifier), document.lines());
                true
            }
            HelpContent::Missing => {
                debug!("No help content for '{}'", identifier);
                notifier.notify(NoticeLevel::Info, "Help", NO_HELP_MESSAGE);
                false
            }
        }
    }

    /// Help key handler: show help for whatever widget has focus
    pub fn on_help_key(
        &self,
        focus: &dyn FocusSource,
        surface: &mut dyn HelpSurface,
        notifier: &mut dyn Notifier,
    ) -> bool {
        match focus.focused_identifier() {
            Some(identifier) => self.display_help(&identifier, surface, notifier),
            None => {
                debug!("Help requested with no focused widget");
                false
            }
        }
    }

    /// Title, a blank line, then the description
    pub fn general_help(&self) -> AnnotatedDocument {
        let general = &self.catalog.general;
        let mut lines = general.title.lines().to_vec();
        lines.push(StyledLine::new(""));
        lines.extend(general.description.lines().iter().cloned());
        AnnotatedDocument::from_lines(lines)
    }

    pub fn show_general_help(&self, surface: &mut dyn HelpSurface) {
        surface.show(GENERAL_HELP_TITLE, self.general_help().lines());
    }
}

/// `Help - <Identifier>` with the identifier capitalized
pub fn window_title(identifier: &str) -> String {
    let mut chars = identifier.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    };
    format!("Help - {}", capitalized)
}
