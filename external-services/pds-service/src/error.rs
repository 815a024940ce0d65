use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdsError {
    #[error("PDS request failed: {0}")]
    RequestFailed(String),

    #[error("PDS unavailable: {0}")]
    Unavailable(String),

    #[error("PDS returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("PDS response could not be read: {0}")]
    InvalidResponse(String),

    #[error("Fake patient data could not be loaded: {0}")]
    DataFile(String),
}

impl From<reqwest::Error> for PdsError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            PdsError::Unavailable(error.to_string())
        } else if error.is_decode() {
            PdsError::InvalidResponse(error.to_string())
        } else {
            PdsError::RequestFailed(error.to_string())
        }
    }
}

impl PdsError {
    /// Whether the failure is on the PDS side rather than in our request.
    pub fn is_unavailable(&self) -> bool {
        match self {
            PdsError::Unavailable(_) => true,
            PdsError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type PdsResult<T> = Result<T, PdsError>;
