//! Python source analysis: parse a file into a typed syntax tree, detect the
//! GUI toolkit it uses and extract the named widgets it constructs.

pub mod detect;
pub mod extract;
pub mod python;
pub mod syntax;
pub mod types;

pub use detect::detect;
pub use extract::{analyze, extract, extract_with, ElementRegistry};
pub use python::{parse_python, PythonParser};
pub use syntax::{Literal, NodeId, NodeKind, Position, SourceUnit, SyntaxNode};
pub use types::{Analysis, ElementRecord, ExtractConfig, Framework};
