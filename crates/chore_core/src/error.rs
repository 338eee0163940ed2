use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("frequency metadata for task `{task}` is not valid JSON: {source}")]
    InvalidMetadata {
        task: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("frequency type `{frequency_type}` requires metadata field `{field}`")]
    MissingMetadata {
        frequency_type: String,
        field: &'static str,
    },

    #[error("unknown weekday `{0}`")]
    UnknownWeekday(String),

    #[error("unknown month `{0}`")]
    UnknownMonth(String),

    #[error("unparseable due date `{0}`")]
    InvalidDueDate(String),

    #[error("malformed task record: {0}")]
    Malformed(#[from] serde_json::Error),
}
