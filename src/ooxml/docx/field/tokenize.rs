//! Shell-like splitting of field instruction text.
//!
//! Space, tab, CR and LF separate tokens; other Unicode spaces such as
//! U+00A0 are ordinary text. A single- or double-quoted run is part of the
//! surrounding token with the quotes removed, so `"a b"` is one token and
//! `x"y z"` yields `xy z`. There is no escape character; a backslash is
//! ordinary text and `\w`-style flags are parsed later from the tokens.
use super::error::TokenizeError;

/// Token separators: space, tab, CR and LF.
#[inline]
pub(crate) fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Split `instruction` into tokens.
///
/// An empty quoted string produces an empty token.
///
/// # Examples
///
/// ```
/// use mergefields::tokenize;
///
/// assert_eq!(tokenize(r#"INCLUDEPICTURE "my pic.png" \w 100"#)?,
///            ["INCLUDEPICTURE", "my pic.png", "\\w", "100"]);
/// assert!(tokenize(r#"a "b"#).is_err());
/// # Ok::<(), mergefields::TokenizeError>(())
/// ```
pub fn tokenize(instruction: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // A token exists once any non-whitespace was seen, even if it was `""`
    let mut in_token = false;
    let mut quote: Option<(char, usize)> = None;

    for (position, c) in instruction.chars().enumerate() {
        match quote {
            Some((open, _)) if c == open => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some((c, position));
                in_token = true;
            },
            None if is_separator(c) => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            },
            None => {
                current.push(c);
                in_token = true;
            },
        }
    }

    if let Some((quote, position)) = quote {
        return Err(TokenizeError::UnbalancedQuote { quote, position });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Fallback split for instructions that [`tokenize`] rejects.
///
/// The first separator-delimited word is kept as is. The remaining words
/// have every quote character removed, which may leave empty tokens.
pub fn tokenize_lenient(instruction: &str) -> Vec<String> {
    let mut words = instruction.split(is_separator).filter(|word| !word.is_empty());
    let Some(field_type) = words.next() else {
        return Vec::new();
    };
    std::iter::once(field_type.to_string())
        .chain(words.map(|word| word.replace(['"', '\''], "")))
        .collect()
}
