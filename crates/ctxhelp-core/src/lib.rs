//! Formatted help documents, the help catalog file format, help lookup and
//! the authoring workflow built on top of them.

pub mod catalog;
pub mod codec;
pub mod document;
pub mod session;
pub mod viewer;

pub use catalog::{GeneralHelp, HelpCatalog, HelpContent};
pub use codec::{decode, encode, LineRecord};
pub use document::{AnnotatedDocument, LineStyle, StyledLine, TagSpec};
pub use session::{AuthoringSession, EntryKey, EntrySummary};
pub use viewer::{ContextualHelp, FocusSource, HelpSurface, NoticeLevel, Notifier};
