//! Session state for iterative query refinement.
//!
//! A [`QuerySession`] owns the translator, the append-only round history,
//! the latest result set and the query/results view toggle. Every mutation
//! commits only after its external call fully succeeds, so a failed
//! operation leaves the session exactly as it was.

use thiserror::Error;

use nlsql_translate::{QueryTranslator, TranslateError, TranslationRound};

mod export;
mod result;

pub use export::{write_csv, write_json, ExportError};
pub use result::{Cell, ExecutionError, QueryExecutor, ResultSet};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("history index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no translation round to refine")]
    NoActiveRound,

    #[error(transparent)]
    Translation(#[from] TranslateError),
}

/// Read-side projection: which of the two stored artifacts is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    ShowingQuery,
    ShowingResults,
}

pub struct QuerySession {
    translator: QueryTranslator,
    latest_round: Option<TranslationRound>,
    latest_results: Option<ResultSet>,
    history: Vec<TranslationRound>,
    view_mode: ViewMode,
    can_toggle: bool,
}

impl QuerySession {
    pub fn new(translator: QueryTranslator) -> Self {
        Self {
            translator,
            latest_round: None,
            latest_results: None,
            history: Vec::new(),
            view_mode: ViewMode::ShowingQuery,
            can_toggle: false,
        }
    }

    pub fn latest_round(&self) -> Option<&TranslationRound> {
        self.latest_round.as_ref()
    }

    pub fn latest_results(&self) -> Option<&ResultSet> {
        self.latest_results.as_ref()
    }

    pub fn history(&self) -> &[TranslationRound] {
        &self.history
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn can_toggle(&self) -> bool {
        self.can_toggle
    }

    /// Translate a fresh question and start a new round. Result-view
    /// toggling stays disabled until an execution succeeds.
    pub async fn submit(
        &mut self,
        question: &str,
        schema_text: &str,
    ) -> Result<&TranslationRound, SessionError> {
        let round = self.translator.translate(question, schema_text, None).await?;
        Ok(self.commit_round(round))
    }

    /// Refine the current round with feedback. The original natural-language
    /// question is resent together with the feedback text.
    pub async fn refine(
        &mut self,
        feedback: &str,
        schema_text: &str,
    ) -> Result<&TranslationRound, SessionError> {
        let question = self
            .latest_round
            .as_ref()
            .map(|r| r.user_query.clone())
            .ok_or(SessionError::NoActiveRound)?;

        let round = self
            .translator
            .translate(&question, schema_text, Some(feedback))
            .await?;
        Ok(self.commit_round(round))
    }

    fn commit_round(&mut self, round: TranslationRound) -> &TranslationRound {
        self.history.push(round.clone());
        self.latest_results = None;
        self.view_mode = ViewMode::ShowingQuery;
        self.can_toggle = false;
        self.latest_round.insert(round)
    }

    /// Record a successful execution and enable view toggling.
    pub fn record_execution(&mut self, results: ResultSet) {
        tracing::debug!(rows = results.row_count(), "execution recorded");
        self.latest_results = Some(results);
        self.can_toggle = true;
    }

    /// Flip the projection. A no-op while toggling is disabled; stored
    /// state is never affected.
    pub fn toggle(&mut self) -> ViewMode {
        if self.can_toggle {
            self.view_mode = match self.view_mode {
                ViewMode::ShowingQuery => ViewMode::ShowingResults,
                ViewMode::ShowingResults => ViewMode::ShowingQuery,
            };
        }
        self.view_mode
    }

    /// Restore a past round. History entries carry no result sets, so any
    /// current results are cleared and toggling is disabled again.
    pub fn select_history(&mut self, index: usize) -> Result<&TranslationRound, SessionError> {
        let round = self
            .history
            .get(index)
            .ok_or(SessionError::IndexOutOfRange {
                index,
                len: self.history.len(),
            })?
            .clone();

        self.latest_results = None;
        self.view_mode = ViewMode::ShowingQuery;
        self.can_toggle = false;
        Ok(self.latest_round.insert(round))
    }
}
