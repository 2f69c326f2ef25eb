use crate::application::pagination::PageWindow;
use crate::application::repos::RepoError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const QUERY_CANCELED: &str = "57014";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => {
            let code = db.code().map(|code| code.into_owned());
            match code.as_deref() {
                Some(UNIQUE_VIOLATION) => RepoError::Duplicate {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                },
                Some(FOREIGN_KEY_VIOLATION) => RepoError::Integrity {
                    message: db.message().to_string(),
                },
                Some(QUERY_CANCELED) => RepoError::Timeout,
                _ => RepoError::from_persistence(db),
            }
        }
        other => RepoError::from_persistence(other),
    }
}

/// `LIMIT` and `OFFSET` binds for a page window.
pub fn limit_offset(window: PageWindow) -> Result<(i64, i64), RepoError> {
    let offset = i64::try_from(window.offset())
        .map_err(|_| RepoError::from_persistence("page offset exceeds i64"))?;
    Ok((i64::from(window.limit), offset))
}

/// Convert a `COUNT(*)` result.
pub fn row_count(count: i64) -> Result<u64, RepoError> {
    u64::try_from(count).map_err(|_| RepoError::from_persistence(format!("negative count {count}")))
}
