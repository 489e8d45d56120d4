//! YAML parsing support

pub mod diagnostics;

pub use diagnostics::{YamlError, YamlSyntaxError};
