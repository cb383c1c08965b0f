/// Core error type for the sleep tracker.
///
/// Adapter crates map their specific errors into this type so the tracker can
/// treat every failure the same way: log it and keep the store consistent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
