use serde::{Deserialize, Serialize};
use std::fmt;

/// GUI toolkit a source file targets, inferred from its imports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framework {
    Unknown,
    Tkinter,
    PyQt,
    PySimpleGUI,
}

impl Framework {
    /// Match a module name against the recognized toolkit prefixes
    pub fn from_module(module: &str) -> Self {
        if module.starts_with("tkinter") || module.starts_with("Tkinter") {
            Framework::Tkinter
        } else if module.starts_with("PyQt") || module.starts_with("PySide") {
            Framework::PyQt
        } else if module.starts_with("PySimpleGUI") {
            Framework::PySimpleGUI
        } else {
            Framework::Unknown
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Framework::Unknown)
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Framework::Unknown => "Unknown",
            Framework::Tkinter => "Tkinter",
            Framework::PyQt => "PyQt",
            Framework::PySimpleGUI => "PySimpleGUI",
        };
        f.write_str(name)
    }
}

/// A named widget found in source code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub identifier: String,
    pub widget_type: String,
}

/// Result of analyzing one source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub framework: Framework,
    pub elements: Vec<ElementRecord>,
}

/// Widget class allowlists for the keyword-named toolkits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub tkinter_widgets: Vec<String>,
    pub pysimplegui_widgets: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            tkinter_widgets: [
                "Button",
                "Label",
                "Entry",
                "Text",
                "Listbox",
                "Combobox",
                "Checkbutton",
                "Radiobutton",
                "Spinbox",
                "Scale",
                "Treeview",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            pysimplegui_widgets: [
                "Button",
                "Text",
                "InputText",
                "Input",
                "Combo",
                "Multiline",
                "Listbox",
                "Checkbox",
                "Radio",
                "Slider",
                "Spin",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_from_module() {
        assert_eq!(Framework::from_module("tkinter"), Framework::Tkinter);
        assert_eq!(Framework::from_module("tkinter.ttk"), Framework::Tkinter);
        assert_eq!(Framework::from_module("Tkinter"), Framework::Tkinter);
        assert_eq!(Framework::from_module("PyQt5.QtWidgets"), Framework::PyQt);
        assert_eq!(Framework::from_module("PySide6"), Framework::PyQt);
        assert_eq!(Framework::from_module("PySimpleGUI"), Framework::PySimpleGUI);
        assert_eq!(Framework::from_module("os"), Framework::Unknown);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ExtractConfig =
            serde_json::from_str(r#"{"tkinter_widgets": ["Canvas"]}"#).unwrap();
        assert_eq!(config.tkinter_widgets, vec!["Canvas".to_string()]);
        assert_eq!(
            config.pysimplegui_widgets,
            ExtractConfig::default().pysimplegui_widgets
        );
    }
}
