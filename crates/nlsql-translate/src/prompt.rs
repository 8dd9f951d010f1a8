//! Grounding prompt assembly.
//!
//! The prompt embeds a fixed per-dialect rule block, the schema text
//! verbatim, the question, and the feedback section (literal `None` when
//! absent), ending at the `SQL Query:` cue the model is expected to answer
//! after.

/// Target SQL dialect. BigQuery additionally carries the identifiers
/// needed for table qualification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    BigQuery {
        project_id: String,
        dataset: String,
    },
    Postgres,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::BigQuery { .. } => "bigquery",
            Dialect::Postgres => "postgres",
        }
    }
}

const BIGQUERY_RULES: &str = r#"- Use PostgreSQL syntax to write the SQL query.
- Provide the answer as only an SQL query in a format ready to be executed on Google BigQuery.
- Provide a brief explanation of the SQL query after the query itself, in the following format: Explanation: [explanation itself]
- If no table or column satisfies the user's request, return a message indicating that a query cannot be created.
- If feedback is provided, use it to refine the query.
- If a column's type is RECORD, the fields of the nested structure are given inside the consecutive parenthesis block. For example: details RECORD(price FLOAT MODE(NULLABLE), quantity INTEGER MODE(REQUIRED)) MODE(NULLABLE)
- If a column's type is RECORD and it is repeated, use the UNNEST function to flatten the structure. Do not use JSON extraction syntax (->>).
- Access nested fields directly using dot notation, for example details.price.
- Do not wrap the SQL query in a comment or code block.
- Do not forget to use aliases when joining tables."#;

const POSTGRES_RULES: &str = r#"- Use PostgreSQL syntax.
- Provide the answer as only an SQL query in a format ready to be executed on PostgreSQL.
- Provide a brief explanation of the SQL query after the query itself, in the following format: Explanation: [explanation itself]
- If no table or column satisfies the user's request, return a message indicating that a query cannot be created.
- If feedback is provided, adjust the SQL query to incorporate it.
- Do not wrap the SQL query in a comment or code block.
- Do not forget to use aliases when joining tables."#;

/// Build the single grounding prompt for one translation call.
pub fn build_prompt(
    dialect: &Dialect,
    schema_text: &str,
    question: &str,
    feedback: Option<&str>,
) -> String {
    let rules = match dialect {
        Dialect::BigQuery { .. } => BIGQUERY_RULES,
        Dialect::Postgres => POSTGRES_RULES,
    };

    format!(
        "You are an expert SQL query generator. Your role is to translate user natural \
         language questions into SQL queries based on a given database schema.\n\
         When giving the answer to the user, follow these rules:\n\n\
         {rules}\n\n\
         The schema is provided in the following format:\n\
         - Each table is listed with its columns inside parentheses.\n\
         - Columns of type RECORD have their fields listed inside nested parentheses.\n\
         - Each column has its mode (NULLABLE or REQUIRED) specified.\n\n\
         Database Schema:\n\
         {schema_text}\n\n\
         Question:\n\
         {question}\n\n\
         Feedback:\n\
         {}\n\n\
         SQL Query:\n",
        feedback.unwrap_or("None"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bigquery() -> Dialect {
        Dialect::BigQuery {
            project_id: "p".into(),
            dataset: "d".into(),
        }
    }

    #[test]
    fn bigquery_rules_cover_nesting_and_flattening() {
        let prompt = build_prompt(&bigquery(), "Tables:\n", "q", None);
        assert!(prompt.contains("UNNEST"));
        assert!(prompt.contains("dot notation"));
        assert!(prompt.contains("->>"));
        assert!(prompt.contains("aliases"));
    }

    #[test]
    fn postgres_rules_skip_warehouse_specifics() {
        let prompt = build_prompt(&Dialect::Postgres, "Tables:\n", "q", None);
        assert!(!prompt.contains("UNNEST"));
        assert!(prompt.contains("PostgreSQL syntax"));
        assert!(prompt.contains("aliases"));
    }

    #[test]
    fn prompt_embeds_schema_question_and_feedback() {
        let prompt = build_prompt(
            &bigquery(),
            "Tables:\n- orders (id INTEGER MODE(REQUIRED))\n",
            "total revenue",
            Some("use a sum"),
        );
        assert!(prompt.contains("Tables:\n- orders (id INTEGER MODE(REQUIRED))"));
        assert!(prompt.contains("Question:\ntotal revenue"));
        assert!(prompt.contains("Feedback:\nuse a sum"));
        assert!(prompt.ends_with("SQL Query:\n"));
    }

    #[test]
    fn absent_feedback_renders_the_none_marker() {
        let prompt = build_prompt(&Dialect::Postgres, "Tables:\n", "q", None);
        assert!(prompt.contains("Feedback:\nNone"));
    }
}
