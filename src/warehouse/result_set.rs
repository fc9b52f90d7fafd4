use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{PostMortemError, PostMortemResult};

/// One value of a tabular result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Result of the last statement of a script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    #[must_use]
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> PostMortemResult<()> {
        if row.len() != self.columns.len() {
            return Err(PostMortemError::InvalidData(format!(
                "row has {} cells for {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder form of `push_row`; rows of the wrong width are dropped.
    #[must_use]
    pub fn with_row(mut self, row: Vec<Cell>) -> Self {
        if row.len() == self.columns.len() {
            self.rows.push(row);
        }
        self
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Decodes every row or none: the first failing row rejects the table.
    pub fn decode<T>(
        &self,
        script: &str,
        mut decode_row: impl FnMut(&RowView<'_>) -> PostMortemResult<T>,
    ) -> PostMortemResult<Vec<T>> {
        self.rows
            .iter()
            .map(|cells| {
                decode_row(&RowView {
                    script,
                    columns: &self.columns,
                    cells,
                })
            })
            .collect()
    }
}

/// Named access to one row. Column lookup ignores case and the quotes pivot
/// queries put around generated column names.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    script: &'a str,
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> RowView<'a> {
    #[must_use]
    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    #[must_use]
    pub fn find(&self, column: &str) -> Option<&'a Cell> {
        self.columns
            .iter()
            .position(|name| normalize_column(name).eq_ignore_ascii_case(normalize_column(column)))
            .and_then(|index| self.cells.get(index))
    }

    pub fn cell(&self, column: &str) -> PostMortemResult<&'a Cell> {
        self.find(column)
            .ok_or_else(|| PostMortemError::malformed(self.script, column, "missing column"))
    }

    pub fn i64(&self, column: &str) -> PostMortemResult<i64> {
        self.opt_i64(column)?
            .ok_or_else(|| PostMortemError::malformed(self.script, column, "unexpected null"))
    }

    pub fn opt_i64(&self, column: &str) -> PostMortemResult<Option<i64>> {
        match self.cell(column)? {
            Cell::Null => Ok(None),
            Cell::Int(value) => Ok(Some(*value)),
            Cell::Float(value) if value.fract() == 0.0 && value.is_finite() => Ok(Some(*value as i64)),
            Cell::Text(text) => text.trim().parse().map(Some).map_err(|_| {
                PostMortemError::malformed(self.script, column, format!("`{text}` is not an integer"))
            }),
            other => Err(self.type_error(column, "integer", other)),
        }
    }

    pub fn f64(&self, column: &str) -> PostMortemResult<f64> {
        self.opt_f64(column)?
            .ok_or_else(|| PostMortemError::malformed(self.script, column, "unexpected null"))
    }

    pub fn opt_f64(&self, column: &str) -> PostMortemResult<Option<f64>> {
        match self.cell(column)? {
            Cell::Null => Ok(None),
            Cell::Int(value) => Ok(Some(*value as f64)),
            Cell::Float(value) if value.is_nan() => Ok(None),
            Cell::Float(value) => Ok(Some(*value)),
            Cell::Text(text) => text.trim().parse().map(Some).map_err(|_| {
                PostMortemError::malformed(self.script, column, format!("`{text}` is not a number"))
            }),
            other => Err(self.type_error(column, "number", other)),
        }
    }

    pub fn text(&self, column: &str) -> PostMortemResult<String> {
        self.opt_text(column)?
            .ok_or_else(|| PostMortemError::malformed(self.script, column, "unexpected null"))
    }

    pub fn opt_text(&self, column: &str) -> PostMortemResult<Option<String>> {
        match self.cell(column)? {
            Cell::Null => Ok(None),
            Cell::Text(text) => Ok(Some(text.clone())),
            Cell::Int(value) => Ok(Some(value.to_string())),
            Cell::Float(value) => Ok(Some(value.to_string())),
            Cell::Date(value) => Ok(Some(value.to_string())),
            Cell::Timestamp(value) => Ok(Some(value.to_string())),
        }
    }

    pub fn date(&self, column: &str) -> PostMortemResult<NaiveDate> {
        self.opt_date(column)?
            .ok_or_else(|| PostMortemError::malformed(self.script, column, "unexpected null"))
    }

    pub fn opt_date(&self, column: &str) -> PostMortemResult<Option<NaiveDate>> {
        match self.cell(column)? {
            Cell::Null => Ok(None),
            Cell::Date(value) => Ok(Some(*value)),
            Cell::Timestamp(value) => Ok(Some(value.date())),
            Cell::Text(text) => parse_date(text.trim()).map(Some).ok_or_else(|| {
                PostMortemError::malformed(self.script, column, format!("`{text}` is not a date"))
            }),
            other => Err(self.type_error(column, "date", other)),
        }
    }

    pub fn timestamp(&self, column: &str) -> PostMortemResult<NaiveDateTime> {
        match self.cell(column)? {
            Cell::Timestamp(value) => Ok(*value),
            Cell::Date(value) => Ok(value.and_time(NaiveTime::MIN)),
            Cell::Text(text) => parse_timestamp(text.trim()).ok_or_else(|| {
                PostMortemError::malformed(
                    self.script,
                    column,
                    format!("`{text}` is not a timestamp"),
                )
            }),
            other => Err(self.type_error(column, "timestamp", other)),
        }
    }

    fn type_error(&self, column: &str, expected: &str, found: &Cell) -> PostMortemError {
        PostMortemError::malformed(
            self.script,
            column,
            format!("expected {expected}, found {found:?}"),
        )
    }
}

/// Strips the single or double quotes a pivot wraps around column names.
#[must_use]
pub fn normalize_column(name: &str) -> &str {
    name.trim().trim_matches(|c| c == '\'' || c == '"')
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(text).map(|value| value.date()))
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}
