use tracing::{debug, warn};

use crate::error::PostMortemResult;

use super::{QueryScript, RowView, Warehouse};

/// Borrowed warehouse plus the session tag stamped on every script.
///
/// Scripts run one at a time; a failing script or an undecodable row fails
/// the call and nothing partial is returned.
pub struct QuerySession<'w, W: Warehouse + ?Sized> {
    warehouse: &'w mut W,
    query_tag: Option<String>,
}

impl<'w, W: Warehouse + ?Sized> QuerySession<'w, W> {
    pub fn new(warehouse: &'w mut W, query_tag: Option<String>) -> Self {
        Self {
            warehouse,
            query_tag,
        }
    }

    #[must_use]
    pub fn query_tag(&self) -> Option<&str> {
        self.query_tag.as_deref()
    }

    /// Executes `script` and decodes every row of its result.
    pub fn fetch<T>(
        &mut self,
        script: QueryScript,
        decode_row: impl FnMut(&RowView<'_>) -> PostMortemResult<T>,
    ) -> PostMortemResult<Vec<T>> {
        let script = script.with_session_tag(self.query_tag.as_deref());
        let label = script.label().to_owned();
        debug!(
            script = %label,
            statements = script.statements().len(),
            "execute warehouse script"
        );
        let result = self.warehouse.execute(&script).inspect_err(|err| {
            warn!(script = %label, error = %err, "warehouse script failed");
        })?;
        let rows = result.decode(&label, decode_row).inspect_err(|err| {
            warn!(script = %label, error = %err, "rejecting undecodable result");
        })?;
        debug!(script = %label, rows = rows.len(), "decoded warehouse result");
        Ok(rows)
    }
}
