use crate::detect::detect;
use crate::python::parse_python;
use crate::syntax::{NodeId, NodeKind, SourceUnit};
use crate::types::{Analysis, ElementRecord, ExtractConfig, Framework};
use ctxhelp_common::{HelpError, Result};
use std::collections::HashSet;
use tracing::{debug, info};

/// How widgets are recognized, fixed for the whole pass
#[derive(Debug, Clone, Copy)]
enum Strategy<'c> {
    /// `button = QtWidgets.QPushButton(...)`: the variable names the widget
    Assignment,
    /// `ttk.Entry(parent, name="task_entry")`: a keyword argument names it
    KeywordCall {
        keyword: &'static str,
        widgets: &'c [String],
    },
}

impl<'c> Strategy<'c> {
    fn for_framework(framework: Framework, config: &'c ExtractConfig) -> Option<Self> {
        match framework {
            Framework::PyQt => Some(Strategy::Assignment),
            Framework::Tkinter => Some(Strategy::KeywordCall {
                keyword: "name",
                widgets: &config.tkinter_widgets,
            }),
            Framework::PySimpleGUI => Some(Strategy::KeywordCall {
                keyword: "key",
                widgets: &config.pysimplegui_widgets,
            }),
            Framework::Unknown => None,
        }
    }

    /// Raw (name, widget type) for a node, if it constructs a named widget
    fn candidate(&self, unit: &SourceUnit, id: NodeId) -> Option<(String, String)> {
        match (self, unit.kind(id)) {
            (Strategy::Assignment, NodeKind::Assign { targets, value }) => {
                let widget_type = attribute_call(unit, *value)?;
                let name = target_name(unit, *targets.first()?)?;
                Some((name, widget_type))
            }
            (Strategy::KeywordCall { keyword, widgets }, NodeKind::Call { keywords, .. }) => {
                let widget_type = attribute_call(unit, id)?;
                if !widgets.iter().any(|w| *w == widget_type) {
                    return None;
                }
                let name = keywords.iter().find_map(|kw| match unit.kind(*kw) {
                    NodeKind::Keyword {
                        arg: Some(arg),
                        value,
                    } if arg == keyword => Some(unit.string_value(*value)),
                    _ => None,
                })?;
                match name {
                    Some(name) => Some((name.to_string(), widget_type)),
                    None => {
                        debug!(
                            "Skipping {} at line {}: '{}' is not a string literal",
                            widget_type,
                            unit.node(id).position.line,
                            keyword
                        );
                        None
                    }
                }
            }
            _ => None,
        }
    }
}

/// Attribute name of a call like `module.Widget(...)`
fn attribute_call(unit: &SourceUnit, id: NodeId) -> Option<String> {
    let NodeKind::Call { func, .. } = unit.kind(id) else {
        return None;
    };
    match unit.kind(*func) {
        NodeKind::Attribute { attr, .. } => Some(attr.clone()),
        _ => None,
    }
}

/// `name = ...` yields `name`, `self.name = ...` yields `name`
fn target_name(unit: &SourceUnit, id: NodeId) -> Option<String> {
    match unit.kind(id) {
        NodeKind::Name(name) => Some(name.clone()),
        NodeKind::Attribute { attr, .. } => Some(attr.clone()),
        _ => None,
    }
}

/// Collects element records while keeping identifiers unique.
///
/// A name that was already seen as an original name is a repeated
/// construction of the same widget and is dropped. A name that collides with
/// an identifier taken some other way gets the first free `_<n>` suffix.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    records: Vec<ElementRecord>,
    taken: HashSet<String>,
    originals: HashSet<String>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with identifiers that are already in use elsewhere
    #[cfg(test)]
    pub(crate) fn with_reserved<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: reserved.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Register a widget; returns the identifier it was stored under, or
    /// `None` when the name was already registered
    pub fn add(&mut self, name: &str, widget_type: &str) -> Option<&str> {
        if self.originals.contains(name) {
            debug!("Skipping duplicate element '{}'", name);
            return None;
        }

        let mut identifier = name.to_string();
        let mut counter = 1;
        while self.taken.contains(&identifier) {
            identifier = format!("{}_{}", name, counter);
            counter += 1;
        }

        self.originals.insert(name.to_string());
        self.taken.insert(identifier.clone());
        self.records.push(ElementRecord {
            identifier,
            widget_type: widget_type.to_string(),
        });
        self.records.last().map(|r| r.identifier.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ElementRecord> {
        self.records
    }
}

/// Extract named widgets using the default allowlists
pub fn extract(unit: &SourceUnit, framework: Framework) -> Vec<ElementRecord> {
    extract_with(unit, framework, &ExtractConfig::default())
}

/// Walk every node of the tree and collect widgets recognized by the
/// strategy for `framework`. Yields nothing for [`Framework::Unknown`].
pub fn extract_with(
    unit: &SourceUnit,
    framework: Framework,
    config: &ExtractConfig,
) -> Vec<ElementRecord> {
    let Some(strategy) = Strategy::for_framework(framework, config) else {
        return Vec::new();
    };

    let mut registry = ElementRegistry::new();
    for id in unit.walk() {
        if let Some((name, widget_type)) = strategy.candidate(unit, id) {
            registry.add(&name, &widget_type);
        }
    }

    debug!("Extracted {} {} elements", registry.len(), framework);
    registry.into_records()
}

/// Parse, detect and extract in one step.
///
/// Syntax errors surface before detection runs; a file without a recognized
/// toolkit import is reported as [`HelpError::NoFrameworkDetected`].
pub fn analyze(source: &str, config: &ExtractConfig) -> Result<Analysis> {
    let unit = parse_python(source)?;

    let framework = detect(&unit);
    if !framework.is_known() {
        return Err(HelpError::NoFrameworkDetected);
    }

    let elements = extract_with(&unit, framework, config);
    info!(
        "Detected GUI framework {} with {} named elements",
        framework,
        elements.len()
    );
    Ok(Analysis {
        framework,
        elements,
    })
}
