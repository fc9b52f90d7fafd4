mod fixture;
mod result_set;
mod session;

pub use fixture::FixtureWarehouse;
pub use result_set::{Cell, ResultSet, RowView, normalize_column};
pub use session::QuerySession;

use crate::error::PostMortemResult;

/// Ordered statements executed as one unit.
///
/// Later statements may read session-scoped temporary tables created by
/// earlier ones, so statements are kept as an explicit list instead of being
/// split out of free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryScript {
    label: String,
    statements: Vec<String>,
}

impl QueryScript {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            statements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Prepends a statement tagging the session, when a tag is configured.
    #[must_use]
    pub fn with_session_tag(mut self, tag: Option<&str>) -> Self {
        if let Some(tag) = tag.filter(|tag| !tag.trim().is_empty()) {
            self.statements.insert(
                0,
                format!("ALTER SESSION SET QUERY_TAG = {}", quote_literal(tag.trim())),
            );
        }
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Whole script as text, one statement per `;`.
    #[must_use]
    pub fn text(&self) -> String {
        self.statements
            .iter()
            .map(|statement| format!("{};", statement.trim().trim_end_matches(';')))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Live, authenticated warehouse session.
///
/// Implementations run the statements of a script in order and return the
/// result of the last one. A failing statement fails the whole script; no
/// partial result is returned.
pub trait Warehouse {
    fn execute(&mut self, script: &QueryScript) -> PostMortemResult<ResultSet>;
}

impl<W: Warehouse + ?Sized> Warehouse for &mut W {
    fn execute(&mut self, script: &QueryScript) -> PostMortemResult<ResultSet> {
        (**self).execute(script)
    }
}

/// Renders a SQL string literal with embedded quotes doubled.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
