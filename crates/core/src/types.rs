/// All timestamps produced by the services are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
