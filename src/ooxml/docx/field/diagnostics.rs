//! Non-fatal findings collected while processing fields.
//!
//! Nothing here stops a pass. Each entry is also logged through `tracing` at
//! warn level when it is recorded.
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A picture field inside another field
    NestedField,
    /// A picture field whose instruction holds other fields
    ContainsNestedField,
    /// Instruction text recovered with the lenient tokenizer
    MalformedInstruction,
    /// A single-valued flag given more than once
    MultipleFlagValues,
    /// A flag value that is not an integer
    InvalidFlagValue,
    /// A picture field without a source argument
    MissingSource,
    /// The anchor paragraph or run is not in the document
    AnchorNotFound,
    /// The picture could not be fetched or embedded
    ResolutionFailed,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NestedField => "nested_field",
            Self::ContainsNestedField => "contains_nested_field",
            Self::MalformedInstruction => "malformed_instruction",
            Self::MultipleFlagValues => "multiple_flag_values",
            Self::InvalidFlagValue => "invalid_flag_value",
            Self::MissingSource => "missing_source",
            Self::AnchorNotFound => "anchor_not_found",
            Self::ResolutionFailed => "resolution_failed",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Instruction text of the field concerned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instruction {
            Some(instruction) => write!(f, "{}: {} <{}>", self.kind, self.message, instruction),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Ordered sink of [`Diagnostic`]s.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding and log it.
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>, instruction: Option<&str>) {
        let message = message.into();
        warn!(kind = %kind, instruction = instruction.unwrap_or(""), "{}", message);
        self.entries.push(Diagnostic {
            kind,
            message,
            instruction: instruction.map(str::to_string),
        });
    }

    /// Move all entries of `other` to the end of this sink without logging again.
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.entries.append(&mut other.entries);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    #[inline]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
