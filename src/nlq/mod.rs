//! Natural-language query translation and validity gating.
//!
//! Flow for one question:
//!
//! 1. [`SchemaContext`] renders the grounding text for the current instant.
//! 2. [`QueryTranslator`] sends exactly one structured-output request to the
//!    oracle and returns its [`TranslatedQuery`] untouched.
//! 3. [`gate::check`] turns a valid translation into an [`AcceptedQuery`] or
//!    rejects it with [`TranslateError::InvalidQuery`].
//!
//! Only an [`AcceptedQuery`] can be handed to the store for execution.
//!
//! The aggregate allow-list in the prompt is advisory. A query that uses other
//! operations but comes back with `isValid = true` is accepted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod context;
pub mod gate;
mod oracle;
mod translator;

pub use context::{
    ColumnSpec, SchemaContext, ALLOWED_AGGREGATES, COLUMNS, SCHEMA_VERSION, TABLE_NAME, TIMEZONE,
    TIMESTAMP_FORMAT,
};
pub use oracle::{
    AssistantMessage, ChatMessage, Choice, CompletionClient, CompletionRequest, CompletionResponse,
    JsonSchemaFormat, OpenAiClient, OracleConfig, OracleError, ResponseFormat, Role,
};
pub use translator::{QueryTranslator, TRANSLATION_TEMPERATURE};

// ---

/// A question as typed by the user. Empty text is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalLanguageQuery(String);

impl NaturalLanguageQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Structured oracle answer. The text and flag always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TranslatedQuery {
    query_text: String,
    is_valid: bool,
}

impl TranslatedQuery {
    pub fn new(query_text: impl Into<String>, is_valid: bool) -> Self {
        // ---
        Self {
            query_text: query_text.into(),
            is_valid,
        }
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn into_parts(self) -> (String, bool) {
        (self.query_text, self.is_valid)
    }
}

/// Query text the gate has let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedQuery(String);

impl AcceptedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Why a question did not produce an executable query.
///
/// The two variants map to different client-facing messages and must not be
/// collapsed.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("oracle judged the generated query invalid")]
    InvalidQuery { query_text: String },
}
