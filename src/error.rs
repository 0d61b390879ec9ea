//! Standard errors used by all functions in the crate.

/// Error collecting all possible failures of the registry client.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Reqwest error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    /// The credential source failed to produce credentials.
    ///
    /// No request is sent to the registry when this happens.
    #[error("failed to resolve credentials: {0}")]
    CredentialResolution(anyhow::Error),
    /// The credential source produced an empty candidate list.
    #[error("credential source returned no credentials")]
    NoCredentials,
    /// A credential contains bytes that cannot be carried in an HTTP header.
    #[error("credential produced an invalid Authorization header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    /// The request body can only be read once, so the request cannot be replayed
    /// with fallback credentials.
    #[error("request with a streaming body cannot be retried with fallback credentials")]
    UnclonableRequest,
    /// Catch-all variant for unexpected errors.
    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<reqwest_middleware::Error> for Error {
    fn from(e: reqwest_middleware::Error) -> Self {
        match e {
            reqwest_middleware::Error::Reqwest(e) => Error::HttpError(e),
            reqwest_middleware::Error::Middleware(e) => {
                e.downcast::<Error>().unwrap_or_else(Error::Other)
            }
        }
    }
}

impl From<Error> for reqwest_middleware::Error {
    fn from(e: Error) -> Self {
        reqwest_middleware::Error::Middleware(e.into())
    }
}
