//! Typed views of field instructions.
use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::flags::FlagSet;
use super::tokenize::{is_separator, tokenize, tokenize_lenient};
use std::fmt;

/// Field types this crate knows how to transform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `INCLUDEPICTURE source [\w pt] [\h pt]`
    IncludePicture,
    /// Any other field type, left untouched
    Other(String),
}

impl DirectiveKind {
    /// Classify an already uppercased field type.
    pub fn from_field_type(field_type: &str) -> Self {
        match field_type {
            "INCLUDEPICTURE" => Self::IncludePicture,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::IncludePicture => "INCLUDEPICTURE",
            Self::Other(name) => name,
        }
    }

    #[inline]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First word of an instruction, uppercased.
///
/// Split on the tokenizer's separators without quote handling, as field type
/// names contain neither. Returns `None` for blank instructions.
pub fn field_type(instruction: &str) -> Option<String> {
    instruction
        .split(is_separator)
        .find(|word| !word.is_empty())
        .map(str::to_ascii_uppercase)
}

/// A tokenized field instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    field_type: String,
    kind: DirectiveKind,
    raw_instruction: String,
    tokens: Vec<String>,
    flags: FlagSet,
}

impl Directive {
    /// Tokenize `raw_instruction`.
    ///
    /// Unbalanced quoting falls back to [`tokenize_lenient`] and records a
    /// [`DiagnosticKind::MalformedInstruction`]. Blank instructions have no
    /// directive.
    pub fn parse(raw_instruction: &str, diagnostics: &mut Diagnostics) -> Option<Self> {
        let field_type = field_type(raw_instruction)?;
        let tokens = match tokenize(raw_instruction) {
            Ok(tokens) => tokens,
            Err(e) => {
                diagnostics.push(
                    DiagnosticKind::MalformedInstruction,
                    format!("invalid field description: {}", e),
                    Some(raw_instruction),
                );
                tokenize_lenient(raw_instruction)
            },
        };
        let flags = FlagSet::parse(tokens.iter().skip(2));

        Some(Self {
            kind: DirectiveKind::from_field_type(&field_type),
            field_type,
            raw_instruction: raw_instruction.to_string(),
            tokens,
            flags,
        })
    }

    /// Uppercased field type, e.g. `INCLUDEPICTURE`.
    #[inline]
    pub fn field_type(&self) -> &str {
        &self.field_type
    }

    #[inline]
    pub fn kind(&self) -> &DirectiveKind {
        &self.kind
    }

    #[inline]
    pub fn raw_instruction(&self) -> &str {
        &self.raw_instruction
    }

    /// Token 0 is the field type, token 1 the primary argument.
    #[inline]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn primary_argument(&self) -> Option<&str> {
        self.tokens.get(1).map(String::as_str)
    }

    #[inline]
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }
}

/// An `INCLUDEPICTURE` instruction.
///
/// Sizes are in points. Zero or negative values count as not given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureDirective {
    directive: Directive,
    source: String,
    width_pt: Option<i64>,
    height_pt: Option<i64>,
}

impl PictureDirective {
    /// Picture view of `directive`, or `None` if it is not a picture field or
    /// names no source.
    pub fn from_directive(directive: Directive, diagnostics: &mut Diagnostics) -> Option<Self> {
        if directive.kind != DirectiveKind::IncludePicture {
            return None;
        }
        let Some(source) = directive.primary_argument().map(str::to_string) else {
            diagnostics.push(
                DiagnosticKind::MissingSource,
                "picture field without a source",
                Some(directive.raw_instruction()),
            );
            return None;
        };

        let width_pt = directive.flags.get_int('w', None, diagnostics).filter(|&w| w > 0);
        let height_pt = directive.flags.get_int('h', None, diagnostics).filter(|&h| h > 0);
        Some(Self {
            directive,
            source,
            width_pt,
            height_pt,
        })
    }

    #[inline]
    pub fn directive(&self) -> &Directive {
        &self.directive
    }

    /// URL, absolute path or document-relative path of the picture.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn width_pt(&self) -> Option<i64> {
        self.width_pt
    }

    #[inline]
    pub fn height_pt(&self) -> Option<i64> {
        self.height_pt
    }
}
