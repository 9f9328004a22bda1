use crate::catalog::HelpCatalog;
use crate::document::AnnotatedDocument;
use ctxhelp_common::Result;
use ctxhelp_parsers::{analyze, Analysis, ExtractConfig, Framework};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// An editable entry of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKey {
    Title,
    Description,
    Element(String),
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Title => f.write_str("General/title"),
            EntryKey::Description => f.write_str("General/description"),
            EntryKey::Element(id) => write!(f, "MainWindow/{}", id),
        }
    }
}

/// One row of the element list shown to the author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub key: EntryKey,
    pub widget_type: Option<String>,
}

/// State of one help-authoring session.
///
/// Edits to the selected entry live in the caller's editor buffer. Selecting
/// another entry commits that buffer to a pending edit; pending edits reach
/// the catalog on save.
#[derive(Debug, Default)]
pub struct AuthoringSession {
    catalog: HelpCatalog,
    config: ExtractConfig,
    framework: Option<Framework>,
    element_types: BTreeMap<String, String>,
    pending: BTreeMap<EntryKey, AnnotatedDocument>,
    current: Option<EntryKey>,
}

impl AuthoringSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ExtractConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(&self) -> &HelpCatalog {
        &self.catalog
    }

    pub fn framework(&self) -> Option<Framework> {
        self.framework
    }

    pub fn current(&self) -> Option<&EntryKey> {
        self.current.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Analyze application source and start a fresh element list.
    /// On failure the session is left as it was.
    pub fn analyze_source(&mut self, source: &str) -> Result<Analysis> {
        let analysis = analyze(source, &self.config)?;

        self.catalog.clear_elements();
        self.catalog.merge_elements(&analysis.elements);
        self.element_types = analysis
            .elements
            .iter()
            .map(|e| (e.identifier.clone(), e.widget_type.clone()))
            .collect();
        self.framework = Some(analysis.framework);
        self.pending.clear();
        self.current = None;

        info!(
            "Session now tracks {} {} elements",
            self.element_types.len(),
            analysis.framework
        );
        Ok(analysis)
    }

    /// Replace the catalog with one read from `bytes`. On failure the
    /// current catalog and pending edits are kept.
    pub fn open_catalog(&mut self, bytes: &[u8]) -> Result<()> {
        let catalog = HelpCatalog::load(bytes)?;
        self.install(catalog);
        Ok(())
    }

    pub fn open_catalog_path(&mut self, path: &Path) -> Result<()> {
        let catalog = HelpCatalog::load_path(path)?;
        self.install(catalog);
        Ok(())
    }

    fn install(&mut self, catalog: HelpCatalog) {
        self.catalog = catalog;
        self.pending.clear();
        self.current = None;
    }

    /// Store the editor buffer as the pending content of the selected entry
    pub fn commit(&mut self, buffer: &AnnotatedDocument) -> bool {
        let Some(key) = self.current.clone() else {
            return false;
        };
        let mut document = buffer.clone();
        document.normalize();
        debug!("Committed {} lines to {}", document.len(), key);
        self.pending.insert(key, document);
        true
    }

    /// Commit the buffer of the current entry, switch to `key` and return
    /// the content the editor should show for it
    pub fn select(&mut self, key: EntryKey, buffer: &AnnotatedDocument) -> AnnotatedDocument {
        self.commit(buffer);
        let content = self.content(&key);
        self.current = Some(key);
        content
    }

    /// Pending edit if any, else the stored document
    pub fn content(&self, key: &EntryKey) -> AnnotatedDocument {
        if let Some(pending) = self.pending.get(key) {
            return pending.clone();
        }
        match key {
            EntryKey::Title => self.catalog.general.title.clone(),
            EntryKey::Description => self.catalog.general.description.clone(),
            EntryKey::Element(id) => self.catalog.element(id).cloned().unwrap_or_default(),
        }
    }

    /// The catalog as it would be saved now
    pub fn snapshot(&self) -> HelpCatalog {
        let mut catalog = self.catalog.clone();
        for (key, document) in &self.pending {
            match key {
                EntryKey::Title => catalog.general.title = document.clone(),
                EntryKey::Description => catalog.general.description = document.clone(),
                EntryKey::Element(id) => catalog.set_element(id.clone(), document.clone()),
            }
        }
        catalog
    }

    /// Commit the buffer, fold pending edits into the catalog and serialize it
    pub fn save(&mut self, buffer: &AnnotatedDocument) -> Result<Vec<u8>> {
        self.commit(buffer);
        let catalog = self.snapshot();
        let bytes = catalog.save()?;
        self.catalog = catalog;
        self.pending.clear();
        Ok(bytes)
    }

    pub fn save_path(&mut self, buffer: &AnnotatedDocument, path: &Path) -> Result<()> {
        let bytes = self.save(buffer)?;
        std::fs::write(path, bytes)?;
        info!("Saved help file {}", path.display());
        Ok(())
    }

    /// General entries first, then every element with its widget type
    pub fn entries(&self) -> Vec<EntrySummary> {
        let mut entries = vec![
            EntrySummary {
                key: EntryKey::Title,
                widget_type: None,
            },
            EntrySummary {
                key: EntryKey::Description,
                widget_type: None,
            },
        ];
        entries.extend(self.catalog.identifiers().map(|id| EntrySummary {
            key: EntryKey::Element(id.to_string()),
            widget_type: self.element_types.get(id).cloned(),
        }));
        entries
    }
}
