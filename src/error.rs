use thiserror::Error;

/// Failure taxonomy for the whole binary.
///
/// `Provider` covers anything a remote service (calendar bridge, Google
/// Calendar, Gemini) did wrong; those never cross the gateway boundary as a
/// crash, they are folded into result values before the orchestrator sees
/// them. `Configuration` is fatal at startup, `Validation` is echoed back to
/// the caller.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Provider(err.to_string())
    }
}
