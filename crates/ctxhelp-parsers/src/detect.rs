use crate::syntax::{NodeKind, SourceUnit};
use crate::types::Framework;
use tracing::debug;

/// Infer the GUI toolkit from the module's top-level imports.
///
/// Only statements directly in the module body are considered; the first
/// import naming a recognized toolkit decides the result.
pub fn detect(unit: &SourceUnit) -> Framework {
    for &id in unit.body() {
        let modules: Vec<&str> = match unit.kind(id) {
            NodeKind::Import { modules } => modules.iter().map(String::as_str).collect(),
            NodeKind::ImportFrom { module, .. } => vec![module.as_str()],
            _ => continue,
        };

        for module in modules {
            let framework = Framework::from_module(module);
            if framework.is_known() {
                debug!("Detected {} from import of '{}'", framework, module);
                return framework;
            }
        }
    }

    Framework::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::parse_python;

    fn detect_source(source: &str) -> Framework {
        detect(&parse_python(source).unwrap())
    }

    #[test]
    fn test_detect_plain_import() {
        assert_eq!(detect_source("import tkinter as tk\n"), Framework::Tkinter);
        assert_eq!(detect_source("import PySimpleGUI as sg\n"), Framework::PySimpleGUI);
    }

    #[test]
    fn test_detect_from_import_uses_module() {
        assert_eq!(
            detect_source("from PyQt5 import QtWidgets\n"),
            Framework::PyQt
        );
        assert_eq!(detect_source("from tkinter import ttk\n"), Framework::Tkinter);
    }

    #[test]
    fn test_prefix_match() {
        assert_eq!(detect_source("import tkinterlike as tk\n"), Framework::Tkinter);
    }

    #[test]
    fn test_first_match_wins() {
        let source = "import os\nimport tkinter\nfrom PyQt5 import QtWidgets\n";
        assert_eq!(detect_source(source), Framework::Tkinter);

        let source = "import os, PySimpleGUI, tkinter\n";
        assert_eq!(detect_source(source), Framework::PySimpleGUI);
    }

    #[test]
    fn test_nested_imports_are_ignored() {
        let source = "def main():\n    import tkinter\n\ntry:\n    import PyQt5\nexcept ImportError:\n    pass\n";
        assert_eq!(detect_source(source), Framework::Unknown);
    }

    #[test]
    fn test_no_imports() {
        assert_eq!(detect_source("x = 1\n"), Framework::Unknown);
        assert_eq!(detect_source(""), Framework::Unknown);
    }
}
