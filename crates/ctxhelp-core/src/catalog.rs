use crate::codec::{decode, encode, LineRecord};
use crate::document::{AnnotatedDocument, StyledLine};
use ctxhelp_common::{HelpError, Result};
use ctxhelp_parsers::ElementRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Application-wide help shown independently of any element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralHelp {
    pub title: AnnotatedDocument,
    pub description: AnnotatedDocument,
}

/// Outcome of looking up help for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpContent<'a> {
    Found(&'a AnnotatedDocument),
    Missing,
}

/// All help entries of one application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpCatalog {
    pub general: GeneralHelp,
    elements: BTreeMap<String, AnnotatedDocument>,
}

// On-disk layout. Section names are fixed by the file format.

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(rename = "General", default)]
    general: GeneralSection,
    #[serde(rename = "MainWindow", default)]
    main_window: MainWindowSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GeneralSection {
    #[serde(default)]
    title: StoredEntry,
    #[serde(default)]
    description: StoredEntry,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MainWindowSection {
    #[serde(default)]
    elements: BTreeMap<String, StoredEntry>,
}

/// Older files stored plain strings instead of line records
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Lines(Vec<LineRecord>),
    Legacy(String),
}

impl Default for StoredEntry {
    fn default() -> Self {
        StoredEntry::Lines(Vec::new())
    }
}

impl StoredEntry {
    fn into_document(self, entry: &str) -> Result<AnnotatedDocument> {
        match self {
            StoredEntry::Lines(records) => decode(&records).map_err(|e| match e {
                HelpError::MalformedTag { tag, reason } => HelpError::MalformedTag {
                    tag,
                    reason: format!("{} (in entry '{}')", reason, entry),
                },
                other => other,
            }),
            StoredEntry::Legacy(text) => {
                debug!("Upgrading legacy string entry '{}'", entry);
                Ok(AnnotatedDocument::from_lines(vec![StyledLine::new(text)]))
            }
        }
    }
}

impl HelpCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skeleton catalog with an empty document for every element
    pub fn from_elements(elements: &[ElementRecord]) -> Self {
        let mut catalog = Self::new();
        catalog.merge_elements(elements);
        catalog
    }

    /// Add an empty document for each element not yet in the catalog;
    /// returns how many were added
    pub fn merge_elements(&mut self, elements: &[ElementRecord]) -> usize {
        let before = self.elements.len();
        for element in elements {
            self.elements
                .entry(element.identifier.clone())
                .or_default();
        }
        self.elements.len() - before
    }

    pub fn load(bytes: &[u8]) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_slice(bytes).map_err(|e| HelpError::InvalidFormat(e.to_string()))?;

        let general = GeneralHelp {
            title: file.general.title.into_document("General.title")?,
            description: file
                .general
                .description
                .into_document("General.description")?,
        };

        let mut elements = BTreeMap::new();
        for (identifier, entry) in file.main_window.elements {
            let document = entry.into_document(&identifier)?;
            elements.insert(identifier, document);
        }

        debug!("Loaded help catalog with {} elements", elements.len());
        Ok(Self { general, elements })
    }

    pub fn load_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => HelpError::NotFound(path.to_path_buf()),
            _ => HelpError::Io(e),
        })?;
        let catalog = Self::load(&bytes).map_err(|e| {
            warn!("Failed to load help file {}: {}", path.display(), e);
            e
        })?;
        info!("Loaded help file {}", path.display());
        Ok(catalog)
    }

    /// Serialize as pretty-printed JSON; legacy string entries are always
    /// written back as line records
    pub fn save(&self) -> Result<Vec<u8>> {
        let file = CatalogFile {
            general: GeneralSection {
                title: StoredEntry::Lines(encode(&self.general.title)),
                description: StoredEntry::Lines(encode(&self.general.description)),
            },
            main_window: MainWindowSection {
                elements: self
                    .elements
                    .iter()
                    .map(|(id, doc)| (id.clone(), StoredEntry::Lines(encode(doc))))
                    .collect(),
            },
        };
        Ok(serde_json::to_vec_pretty(&file)?)
    }

    pub fn save_path(&self, path: &Path) -> Result<()> {
        fs::write(path, self.save()?)?;
        info!("Saved help file {}", path.display());
        Ok(())
    }

    pub fn lookup(&self, identifier: &str) -> HelpContent<'_> {
        match self.elements.get(identifier) {
            Some(document) => HelpContent::Found(document),
            None => HelpContent::Missing,
        }
    }

    pub fn element(&self, identifier: &str) -> Option<&AnnotatedDocument> {
        self.elements.get(identifier)
    }

    pub fn set_element(&mut self, identifier: impl Into<String>, document: AnnotatedDocument) {
        self.elements.insert(identifier.into(), document);
    }

    pub fn elements(&self) -> impl Iterator<Item = (&str, &AnnotatedDocument)> {
        self.elements.iter().map(|(id, doc)| (id.as_str(), doc))
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear_elements(&mut self) {
        self.elements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TagSpec;
    use std::io::Write;

    fn element(identifier: &str, widget_type: &str) -> ElementRecord {
        ElementRecord {
            identifier: identifier.to_string(),
            widget_type: widget_type.to_string(),
        }
    }

    #[test]
    fn test_load_full_catalog() {
        let json = r##"{
          "General": {
            "title": [{"text": "Todo", "tags": {"bold": true, "size_18": true}}],
            "description": [{"text": "A small list", "tags": {}}]
          },
          "MainWindow": {
            "elements": {
              "add_button": [{"text": "Adds the task", "tags": {"color_#008000": true}}],
              "task_entry": [{"text": "Type here", "tags": {}}, {"text": "", "tags": {}}]
            }
          }
        }"##;

        let catalog = HelpCatalog::load(json.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.general.title.lines()[0].text(), "Todo");
        assert!(catalog.general.title.lines()[0].has(&TagSpec::FontSize(18)));

        let HelpContent::Found(doc) = catalog.lookup("add_button") else {
            panic!("add_button should have help");
        };
        assert_eq!(doc.lines()[0].tags(), &[TagSpec::Color("#008000".into())]);
        assert_eq!(catalog.element("task_entry").map(|d| d.len()), Some(2));
    }

    #[test]
    fn test_legacy_string_entry_is_upgraded() {
        let json = r#"{"MainWindow": {"elements": {"foo": "Click here"}}}"#;
        let catalog = HelpCatalog::load(json.as_bytes()).unwrap();

        let expected = AnnotatedDocument::from_lines(vec![StyledLine::new("Click here")]);
        assert_eq!(catalog.element("foo"), Some(&expected));
        assert!(catalog.general.title.is_empty());

        let saved: serde_json::Value = serde_json::from_slice(&catalog.save().unwrap()).unwrap();
        assert_eq!(
            saved["MainWindow"]["elements"]["foo"],
            serde_json::json!([{"text": "Click here", "tags": {}}])
        );
    }

    #[test]
    fn test_legacy_general_strings() {
        let json = r#"{"General": {"title": "My App", "description": ""}}"#;
        let catalog = HelpCatalog::load(json.as_bytes()).unwrap();
        assert_eq!(catalog.general.title.plain_text(), "My App");
        assert_eq!(catalog.general.description.len(), 1);
    }

    #[test]
    fn test_missing_lookup_is_not_an_error() {
        let catalog = HelpCatalog::load(br#"{"MainWindow": {"elements": {}}}"#).unwrap();
        assert_eq!(catalog.lookup("unknown_widget"), HelpContent::Missing);
    }

    #[test]
    fn test_invalid_format() {
        let payloads: [&[u8]; 4] = [
            b"not json",
            b"42",
            br#"{"General": {"title": {"text": "x"}}}"#,
            br#"{"MainWindow": {"elements": {"a": 5}}}"#,
        ];
        for payload in payloads {
            let err = HelpCatalog::load(payload).unwrap_err();
            assert!(matches!(err, HelpError::InvalidFormat(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_malformed_tag_names_entry() {
        let json = r#"{"MainWindow": {"elements": {"b": [{"text": "x", "tags": {"size_x": true}}]}}}"#;
        match HelpCatalog::load(json.as_bytes()).unwrap_err() {
            HelpError::MalformedTag { tag, reason } => {
                assert_eq!(tag, "size_x");
                assert!(reason.contains("'b'"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut catalog = HelpCatalog::from_elements(&[element("btn", "Button")]);
        catalog.general.title = AnnotatedDocument::from_lines(vec![
            StyledLine::new("Title").with_tag(TagSpec::Bold)
        ]);
        catalog.set_element(
            "btn",
            AnnotatedDocument::from_lines(vec![StyledLine::new("Press it")
                .with_tag(TagSpec::Underline)
                .with_tag(TagSpec::FontFamily("Courier".into()))]),
        );

        let bytes = catalog.save().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"General\""));
        assert!(text.contains("\"MainWindow\""));
        assert!(text.contains("\n  \"General\""));

        assert_eq!(HelpCatalog::load(&bytes).unwrap(), catalog);
    }

    #[test]
    fn test_merge_elements_keeps_existing_documents() {
        let mut catalog = HelpCatalog::from_elements(&[element("a", "Button")]);
        catalog.set_element("a", AnnotatedDocument::from_text("kept"));

        let added = catalog.merge_elements(&[element("a", "Button"), element("b", "Label")]);
        assert_eq!(added, 1);
        assert_eq!(catalog.element("a").unwrap().plain_text(), "kept");
        assert!(catalog.element("b").unwrap().is_empty());
        assert_eq!(catalog.identifiers().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_load_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ftxt");
        assert!(matches!(
            HelpCatalog::load_path(&missing).unwrap_err(),
            HelpError::NotFound(p) if p == missing
        ));

        let broken = dir.path().join("broken.ftxt");
        let mut file = fs::File::create(&broken).unwrap();
        file.write_all(b"{\"General\": ").unwrap();
        assert!(matches!(
            HelpCatalog::load_path(&broken).unwrap_err(),
            HelpError::InvalidFormat(_)
        ));
    }

    #[test]
    fn test_save_path_then_load_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("help.ftxt");
        let catalog = HelpCatalog::from_elements(&[element("task_entry", "Entry")]);
        catalog.save_path(&path).unwrap();
        assert_eq!(HelpCatalog::load_path(&path).unwrap(), catalog);
    }
}
