//! Equality filters over catalog records.
//!
//! Every set condition narrows the result; unset conditions match
//! everything. Results are ordered newest first.

use crate::error::Result;
use crate::models::sqlx_hates_paths;
use kodak_manip::ImageFormat;
use sqlx::{QueryBuilder, Sqlite};
use std::path::PathBuf;
use uuid::Uuid;

const NEWEST_FIRST: &str = " ORDER BY created DESC, rowid DESC";

/// Filter over [`SourceRecord`](crate::models::SourceRecord)s.
///
/// ```
/// use kodak_catalog::SourceQuery;
/// let live_cats = SourceQuery::new().name("a-cat").deleted(false);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceQuery {
    id: Option<Uuid>,
    name: Option<String>,
    source: Option<PathBuf>,
    format: Option<ImageFormat>,
    deleted: Option<bool>,
}
impl SourceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub(crate) fn build(&self) -> Result<QueryBuilder<'static, Sqlite>> {
        let mut builder = QueryBuilder::new(include_str!("../queries/select_sources.sql"));
        if let Some(id) = self.id {
            builder.push(" AND id = ").push_bind(id.to_string());
        }
        if let Some(name) = &self.name {
            builder.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(source) = &self.source {
            builder.push(" AND source = ").push_bind(sqlx_hates_paths(source)?);
        }
        if let Some(format) = self.format {
            builder.push(" AND format = ").push_bind(format.as_name());
        }
        if let Some(deleted) = self.deleted {
            builder.push(" AND deleted = ").push_bind(deleted);
        }
        builder.push(NEWEST_FIRST);
        Ok(builder)
    }
}

/// Filter over [`DerivedRecord`](crate::models::DerivedRecord)s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedQuery {
    id: Option<Uuid>,
    parent: Option<Uuid>,
    name: Option<String>,
    format: Option<ImageFormat>,
}
impl DerivedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn parent(mut self, parent: Uuid) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub(crate) fn build(&self) -> Result<QueryBuilder<'static, Sqlite>> {
        let mut builder = QueryBuilder::new(include_str!("../queries/select_derived.sql"));
        if let Some(id) = self.id {
            builder.push(" AND id = ").push_bind(id.to_string());
        }
        if let Some(parent) = self.parent {
            builder.push(" AND parent = ").push_bind(parent.to_string());
        }
        if let Some(name) = &self.name {
            builder.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(format) = self.format {
            builder.push(" AND format = ").push_bind(format.as_name());
        }
        builder.push(NEWEST_FIRST);
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        let builder = SourceQuery::new().build().unwrap();
        assert!(builder.sql().trim_end().ends_with("WHERE 1 = 1\n ORDER BY created DESC, rowid DESC"));
    }

    #[test]
    fn test_conditions_are_joined_with_and() {
        let builder = SourceQuery::new().name("a-cat").deleted(false).build().unwrap();
        let sql = builder.sql();
        assert!(sql.contains(" AND name = ? AND deleted = ?"));
        let builder = DerivedQuery::new().parent(Uuid::new_v4()).format(ImageFormat::Png).build().unwrap();
        assert!(builder.sql().contains(" AND parent = ? AND format = ?"));
    }
}
