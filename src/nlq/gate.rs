//! Validity gate between translation and execution.
//!
//! The gate trusts the oracle's flag completely and never looks at the query
//! text. An [`AcceptedQuery`] can only be obtained through [`check`].

use super::{AcceptedQuery, TranslateError, TranslatedQuery};

// ---

/// Accept a translation whose validity flag is set, reject it otherwise.
///
/// The accepted text is handed on byte-for-byte.
pub fn check(translated: TranslatedQuery) -> Result<AcceptedQuery, TranslateError> {
    // ---
    let (query_text, is_valid) = translated.into_parts();
    if is_valid {
        Ok(AcceptedQuery(query_text))
    } else {
        Err(TranslateError::InvalidQuery { query_text })
    }
}
