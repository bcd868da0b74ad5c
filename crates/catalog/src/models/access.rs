use super::RecordMeta;
use crate::error::Error;

/// Stored access credential. Opaque to the catalog; authentication is up
/// to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub meta: RecordMeta,
    pub password: String,
}
impl AccessRecord {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AccessRow {
    pub id: String,
    pub created: i64,
    pub password: String,
}
impl From<&AccessRecord> for AccessRow {
    fn from(record: &AccessRecord) -> Self {
        Self {
            id: record.meta.id.to_string(),
            created: record.meta.created.unix_timestamp(),
            password: record.password.clone(),
        }
    }
}
impl TryFrom<AccessRow> for AccessRecord {
    type Error = Error;
    fn try_from(row: AccessRow) -> Result<Self, Self::Error> {
        Ok(Self {
            meta: RecordMeta::from_row(&row.id, row.created)?,
            password: row.password,
        })
    }
}
