//! Translation of one question into a [`TranslatedQuery`].

use std::sync::Arc;

use tracing::{info, warn};

use super::{
    gate, AcceptedQuery, ChatMessage, CompletionClient, CompletionRequest, CompletionResponse,
    NaturalLanguageQuery, OpenAiClient, OracleConfig, OracleError, ResponseFormat, Role,
    SchemaContext, TranslateError, TranslatedQuery,
};

// ---

/// Sampling temperature sent with every request.
pub const TRANSLATION_TEMPERATURE: f32 = 0.0;

/// Stateless adapter over a [`CompletionClient`].
///
/// Cheap to share: clone the `Arc` around it, or the translator itself.
#[derive(Clone)]
pub struct QueryTranslator {
    client: Arc<dyn CompletionClient>,
    model: String,
}

impl QueryTranslator {
    pub fn new(client: Arc<dyn CompletionClient>, model: impl Into<String>) -> Self {
        // ---
        Self {
            client,
            model: model.into(),
        }
    }

    /// Translator backed by the production HTTP client.
    pub fn from_config(config: OracleConfig) -> Result<Self, OracleError> {
        // ---
        let model = config.model.clone();
        let client = OpenAiClient::new(config)?;
        Ok(Self::new(Arc::new(client), model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Assemble the single request sent for `query`.
    pub fn build_request(
        &self,
        query: &NaturalLanguageQuery,
        context: &SchemaContext,
    ) -> CompletionRequest {
        // ---
        CompletionRequest {
            model: self.model.clone(),
            temperature: TRANSLATION_TEMPERATURE,
            messages: vec![ChatMessage {
                role: Role::System,
                content: instruction(query, context),
            }],
            response_format: ResponseFormat::translated_query(),
        }
    }

    /// Translate against a context snapshot taken now.
    pub async fn translate(
        &self,
        query: &NaturalLanguageQuery,
    ) -> Result<TranslatedQuery, OracleError> {
        // ---
        self.translate_with(query, &SchemaContext::now()).await
    }

    /// Translate against an explicit context snapshot.
    ///
    /// Exactly one call reaches the client. Its failure is returned as-is.
    pub async fn translate_with(
        &self,
        query: &NaturalLanguageQuery,
        context: &SchemaContext,
    ) -> Result<TranslatedQuery, OracleError> {
        // ---
        let request = self.build_request(query, context);
        let response = self.client.complete(&request).await?;
        structured_payload(response)
    }

    /// Translate, then run the result through the validity gate.
    pub async fn accept(&self, query: &NaturalLanguageQuery) -> Result<AcceptedQuery, TranslateError> {
        // ---
        info!(state = "received", input = %query.as_str(), "Translating question");

        let translated = self.translate(query).await.map_err(|e| {
            warn!(state = "failed", "Translation oracle error: {}", e);
            e
        })?;
        info!(
            state = "translated",
            is_valid = translated.is_valid(),
            query = %translated.query_text(),
            "Oracle answered"
        );

        match gate::check(translated) {
            Ok(accepted) => {
                info!(state = "accepted", "Query accepted for execution");
                Ok(accepted)
            }
            Err(e) => {
                warn!(state = "rejected", "{}", e);
                Err(e)
            }
        }
    }
}

/// The instruction message: role, rules, schema context, then the literal question.
fn instruction(query: &NaturalLanguageQuery, context: &SchemaContext) -> String {
    // ---
    format!(
        "You are an expert SQL developer. Given the natural language query and the \
         database schema below, write one valid PostgreSQL query that can be executed \
         against the database.\n\
         \n\
         Use only the aggregate functions listed under ALLOWED SQL Aggregate Functions. \
         If the question cannot be answered by a single valid query that follows these \
         rules, set isValid to false and return an empty queryText.\n\
         \n\
         {context}\n\
         \n\
         Natural Language Query:\n\
         \"{question}\"\n",
        context = context.render(),
        question = query.as_str(),
    )
}

/// Extract the structured answer from the first candidate.
fn structured_payload(response: CompletionResponse) -> Result<TranslatedQuery, OracleError> {
    // ---
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(OracleError::NoCandidate)?;

    if let Some(refusal) = choice.message.refusal {
        return Err(OracleError::Refused(refusal));
    }

    let content = choice
        .message
        .content
        .ok_or_else(|| OracleError::Malformed("message has no content".to_string()))?;

    serde_json::from_str(&content).map_err(|e| OracleError::Malformed(e.to_string()))
}
