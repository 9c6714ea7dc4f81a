use thiserror::Error as ThisError;

/// Errors surfaced by the logging core.
///
/// Field encoding never fails for valid input, so the only error the public
/// API reports is an I/O failure from the underlying sink. It is returned
/// once from the finishing call (`finish`, `msg`, `print`); the library does
/// not retry or fall back.
#[derive(ThisError, Debug)]
pub enum Error {
    /// The sink rejected a fully assembled line.
    #[error("sink write error: {0}")]
    Sink(#[from] std::io::Error),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
