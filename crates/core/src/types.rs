/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Identifies one orchestration run and its progress record.
///
/// In the diary domain this is the diary entry ID.
pub type JobKey = DbId;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
