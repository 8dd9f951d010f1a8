//! Natural-language to SQL translation.
//!
//! [`QueryTranslator`] builds a schema-grounded prompt, calls a
//! [`TextGenerator`] collaborator once (no retries), parses the response
//! into SQL + explanation, and for the warehouse dialect rewrites bare
//! table references into fully-qualified identifiers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod generator;
mod prompt;
mod qualify;
mod translator;

pub use generator::{OpenAiGenerator, TextGenerator};
pub use prompt::{build_prompt, Dialect};
pub use qualify::qualify;
pub use translator::{QueryTranslator, DEFAULT_MAX_TOKENS, STOP_MARKER, TEMPERATURE};

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("model response contained neither SQL nor an explanation")]
    EmptyResponse,
}

/// One question → SQL → explanation outcome. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRound {
    pub user_query: String,
    pub sql_query: String,
    pub explanation: String,
}
