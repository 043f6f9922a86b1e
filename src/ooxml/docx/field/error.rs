//! Error types for complex-field processing.
use crate::ooxml::error::OoxmlError;
use thiserror::Error;

/// Result type for field operations.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors raised while discovering or transforming fields.
///
/// `Unterminated`, `NestedSimpleField`, `WorklistOutOfOrder` and
/// `AmbiguousAnchor` describe a document that cannot be scanned safely and
/// abort the whole pass. `Resolution` only ever concerns one field.
#[derive(Error, Debug)]
pub enum FieldError {
    /// A begin marker with no reachable end marker
    #[error("field begin without end near: {instruction:?}")]
    Unterminated { instruction: String },

    /// A `w:fldSimple` inside a complex field
    #[error("simple field nested inside a complex field")]
    NestedSimpleField,

    /// A nested begin marker that is not next in the worklist
    #[error("nested field begin marker out of document order")]
    WorklistOutOfOrder,

    /// More than one element matched a field anchor
    #[error("more than one {what} matches the field anchor ({count} found)")]
    AmbiguousAnchor { what: &'static str, count: usize },

    /// The picture source could not be retrieved
    #[error("cannot resolve picture source {location:?}: {reason}")]
    Resolution { location: String, reason: String },

    #[error(transparent)]
    Ooxml(#[from] OoxmlError),
}

impl FieldError {
    /// Whether the error aborts the whole document pass.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Unterminated { .. }
                | Self::NestedSimpleField
                | Self::WorklistOutOfOrder
                | Self::AmbiguousAnchor { .. }
        )
    }

    pub(crate) fn resolution(location: &str, reason: impl ToString) -> Self {
        Self::Resolution {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Strict tokenization failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// A quote opened at `position` (character offset) was never closed
    #[error("no closing quotation for {quote} opened at {position}")]
    UnbalancedQuote { quote: char, position: usize },
}
