//! `\x`-style switches in field instructions.
use super::diagnostics::{DiagnosticKind, Diagnostics};
use std::collections::BTreeMap;

/// Switches of one field instruction, by single-character name.
///
/// A token starting with `\` followed by at least one character opens the
/// switch named by that character. Text glued to the name (`\w100`) is its
/// first argument, and every following plain token up to the next switch is
/// appended. Plain tokens before the first switch are dropped.
///
/// # Examples
///
/// ```
/// use mergefields::FlagSet;
///
/// let flags = FlagSet::parse(["\\w100", "\\h", "200", "\\*", "MERGEFORMAT"]);
/// assert_eq!(flags.get('w'), Some(&["100".to_string()][..]));
/// assert_eq!(flags.get('h'), Some(&["200".to_string()][..]));
/// assert!(flags.contains('*'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    flags: BTreeMap<char, Vec<String>>,
}

impl FlagSet {
    pub fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags: BTreeMap<char, Vec<String>> = BTreeMap::new();
        let mut current: Option<char> = None;

        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() {
                continue;
            }

            let mut chars = token.chars();
            if let (Some('\\'), Some(name)) = (chars.next(), chars.next()) {
                let args = flags.entry(name).or_default();
                let glued = chars.as_str();
                if !glued.is_empty() {
                    args.push(glued.to_string());
                }
                current = Some(name);
            } else if let Some(name) = current {
                flags.entry(name).or_default().push(token.to_string());
            }
        }

        Self { flags }
    }

    /// Arguments of a switch, if it was given.
    pub fn get(&self, name: char) -> Option<&[String]> {
        self.flags.get(&name).map(Vec::as_slice)
    }

    #[inline]
    pub fn contains(&self, name: char) -> bool {
        self.flags.contains_key(&name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &[String])> {
        self.flags.iter().map(|(&name, args)| (name, args.as_slice()))
    }

    /// Integer value of a single-valued switch.
    ///
    /// Returns `default` when the switch is absent, has no argument, or its
    /// first argument is not an integer (the latter with a diagnostic).
    /// Extra arguments are reported and ignored.
    pub fn get_int(&self, name: char, default: Option<i64>, diagnostics: &mut Diagnostics) -> Option<i64> {
        let args = match self.flags.get(&name) {
            Some(args) if !args.is_empty() => args,
            _ => return default,
        };

        if args.len() > 1 {
            diagnostics.push(
                DiagnosticKind::MultipleFlagValues,
                format!("multiple values for flag {}: {:?}", name, args),
                None,
            );
        }

        match args[0].trim().parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                diagnostics.push(
                    DiagnosticKind::InvalidFlagValue,
                    format!("invalid value for flag {}: {:?}", name, args),
                    None,
                );
                default
            },
        }
    }
}
