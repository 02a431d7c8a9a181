/// Core error type for the worker.
///
/// Adapter crates map their specific failures into this type so the worker
/// can handle remote faults consistently. `Rpc` deliberately renders as the
/// bare provider message: transfer classification substring-matches on it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("VALIDATION_ERROR: {0}")]
    Validation(String),

    #[error("BATCH_TOO_LARGE: {0}")]
    BatchTooLarge(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A gift descriptor from which no remote reference can be built.
    #[error("cannot build gift reference: {0}")]
    Reference(String),

    /// Provider-side RPC failure carrying the raw upstream message.
    #[error("{0}")]
    Rpc(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
