// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostics for `contactd.toml`.
//!
//! Figment extraction failures and semantic validation failures both become
//! [`ConfigError`] values. Unknown keys are checked against the contactd key
//! table in [`crate::model::SECTIONS`], so a typo gets a "did you mean" and a
//! key filed under the wrong `[section]` gets pointed at the right one.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

use crate::model::{SECTIONS, section_keys};

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Source name registered for TOML passed in as a string.
pub const INLINE_SOURCE: &str = "<inline>";

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(contactd::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Enclosing `[section]`, `None` at the top level.
        section: Option<String>,
        /// A close key in the same section, or `section.key` when the key
        /// belongs to another section.
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a contactd setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(contactd::config::invalid_type), help("`{key}` expects {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid value for `{key}`: {message}")]
    #[diagnostic(
        code(contactd::config::invalid_value),
        help("set `{key}` in contactd.toml or export {env_var}")
    )]
    InvalidValue {
        key: String,
        message: String,
        env_var: String,
    },

    #[error("configuration error: {0}")]
    #[diagnostic(code(contactd::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
            env_var: env_var_name(key),
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Environment variable overriding a dotted key: `bus.capacity` is
/// `CONTACTD_BUS_CAPACITY`.
pub fn env_var_name(key: &str) -> String {
    format!("CONTACTD_{}", key.replace('.', "_").to_ascii_uppercase())
}

/// Convert a `figment::Error` into one diagnostic per underlying failure.
///
/// `sources` pairs a file path (or [`INLINE_SOURCE`]) with its TOML text and
/// is used to point each diagnostic at the offending line.
pub fn from_figment(err: figment::Error, sources: &[(String, String)]) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<&str> = error.path.iter().map(String::as_str).collect();
            match &error.kind {
                Kind::UnknownField(field, _) => {
                    let section = path.first().copied();
                    let (span, src) = pointer(&error, section, field, sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: section.map(str::to_string),
                        suggestion: suggest_key(section, field),
                        valid_keys: valid_keys(section),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(actual, expected) => {
                    let (section, key) = match path.as_slice() {
                        [section, key] => (Some(*section), *key),
                        [key] => (None, *key),
                        _ => (None, ""),
                    };
                    let (span, src) = pointer(&error, section, key, sources);
                    ConfigError::InvalidType {
                        key: path.join("."),
                        found: actual.to_string(),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn valid_keys(section: Option<&str>) -> String {
    match section {
        None => SECTIONS
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", "),
        Some(section) => section_keys(section).unwrap_or_default().join(", "),
    }
}

/// Suggest a replacement for `unknown` inside `section` (section names at
/// the top level). Falls back to an exact match in another section,
/// returned as `section.key`.
pub fn suggest_key(section: Option<&str>, unknown: &str) -> Option<String> {
    let candidates: Vec<&str> = match section {
        None => SECTIONS.iter().map(|(name, _)| *name).collect(),
        Some(section) => section_keys(section).unwrap_or_default().to_vec(),
    };

    candidates
        .into_iter()
        .map(|candidate| (strsim::jaro_winkler(unknown, candidate), candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
        .or_else(|| misplaced(section, unknown))
}

fn misplaced(section: Option<&str>, key: &str) -> Option<String> {
    SECTIONS
        .iter()
        .filter(|(name, _)| Some(*name) != section)
        .find(|(_, keys)| keys.contains(&key))
        .map(|(name, _)| format!("{name}.{key}"))
}

fn pointer(
    error: &figment::error::Error,
    section: Option<&str>,
    key: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    sources
        .iter()
        .find(|(name, _)| match &file {
            Some(path) => name == path,
            None => name == INLINE_SOURCE,
        })
        .and_then(|(name, content)| {
            locate_key(content, section, key)
                .map(|span| (Some(span), Some(NamedSource::new(name, content.clone()))))
        })
        .unwrap_or((None, None))
}

/// Span of `key` within `[section]`, or of a `[key]` table header when
/// `section` is `None`.
///
/// Table headers are tracked line by line, so the same key name under a
/// different section never matches.
pub fn locate_key(content: &str, section: Option<&str>, key: &str) -> Option<SourceSpan> {
    let mut current: Option<&str> = None;
    let mut line_start = 0;

    for line in content.split_inclusive('\n') {
        let start = line_start;
        line_start += line.len();
        let trimmed = line.trim();

        if let Some((header, _)) = trimmed.strip_prefix('[').and_then(|h| h.split_once(']')) {
            let name = unquote(header);
            if section.is_none() && name == key {
                return line.find(key).map(|at| SourceSpan::new((start + at).into(), key.len()));
            }
            current = Some(name);
            continue;
        }

        if current != section {
            continue;
        }
        if let Some((lhs, _)) = trimmed.split_once('=')
            && unquote(lhs) == key
        {
            return line.find(key).map(|at| SourceSpan::new((start + at).into(), key.len()));
        }
    }

    None
}

fn unquote(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}

/// Render every error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    eprintln!(
        "contactd: {} configuration error(s), refusing to start",
        errors.len()
    );
}
