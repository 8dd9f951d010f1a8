//! The translation protocol: prompt → generator call → parsed round.

use crate::{
    build_prompt, qualify, Dialect, TextGenerator, TranslateError, TranslationRound,
};

/// Low temperature to favor deterministic SQL output.
pub const TEMPERATURE: f32 = 0.3;

/// Output-length budget when the caller does not configure one.
pub const DEFAULT_MAX_TOKENS: u32 = 200;

/// Stop sequence in case the model starts re-emitting the prompt template.
pub const STOP_MARKER: &str = "SQL Query:";

const EXPLANATION_MARKER: &str = "Explanation:";
const NO_EXPLANATION: &str = "No explanation provided.";

pub struct QueryTranslator {
    generator: Box<dyn TextGenerator>,
    dialect: Dialect,
    max_tokens: u32,
}

impl QueryTranslator {
    pub fn new(generator: Box<dyn TextGenerator>, dialect: Dialect) -> Self {
        Self {
            generator,
            dialect,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// One translation call. A generator failure or an unparsable response
    /// propagates as [`TranslateError`] and produces no round.
    pub async fn translate(
        &self,
        question: &str,
        schema_text: &str,
        feedback: Option<&str>,
    ) -> Result<TranslationRound, TranslateError> {
        let prompt = build_prompt(&self.dialect, schema_text, question, feedback);
        tracing::debug!(
            dialect = self.dialect.name(),
            prompt_chars = prompt.len(),
            has_feedback = feedback.is_some(),
            "translating question"
        );

        let raw = self
            .generator
            .generate(&prompt, self.max_tokens, TEMPERATURE, &[STOP_MARKER.to_string()])
            .await?;

        let (mut sql_query, explanation) = parse_response(&raw)?;

        if let Dialect::BigQuery {
            project_id,
            dataset,
        } = &self.dialect
        {
            sql_query = qualify(&sql_query, schema_text, project_id, dataset);
        }

        tracing::info!(sql = %sql_query, "translation complete");

        Ok(TranslationRound {
            user_query: question.to_string(),
            sql_query,
            explanation,
        })
    }
}

/// Split the raw model output into (SQL, explanation).
///
/// Everything before the first `Explanation:` marker is the SQL candidate;
/// a missing marker yields the literal fallback explanation. A leading
/// `sql` preamble is truncated to the first `select` occurrence, both
/// case-insensitive.
fn parse_response(raw: &str) -> Result<(String, String), TranslateError> {
    let raw = raw.trim();

    let (sql_part, explanation) = match raw.find(EXPLANATION_MARKER) {
        Some(idx) => (
            &raw[..idx],
            raw[idx + EXPLANATION_MARKER.len()..].trim().to_string(),
        ),
        None => (raw, NO_EXPLANATION.to_string()),
    };

    let mut sql = sql_part.trim().to_string();
    if starts_with_ignore_ascii_case(&sql, "sql") {
        if let Some(pos) = find_ignore_ascii_case(&sql, "select") {
            sql = sql[pos..].trim().to_string();
        }
    }

    // Unparsable means neither SQL text nor an explanation marker.
    if sql.is_empty() && explanation == NO_EXPLANATION {
        return Err(TranslateError::EmptyResponse);
    }

    Ok((sql, explanation))
}

fn starts_with_ignore_ascii_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
/// Indexes are taken on `haystack` itself, so the result is always a valid
/// char boundary regardless of what surrounds the match.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.char_indices().map(|(i, _)| i).find(|&i| {
        haystack
            .get(i..i + needle.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(needle))
    })
}
