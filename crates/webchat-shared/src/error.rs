use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimestampError {
    #[error("Empty timestamp")]
    Empty,

    #[error("Unrecognized timestamp '{value}': {source}")]
    Unrecognized {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
