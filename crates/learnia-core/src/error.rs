use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid body: {0}")]
    InvalidBody(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("catalog unavailable: {0}")]
    Catalog(String),

    #[error("favorites error: {0}")]
    Favorites(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status code this error renders as.
    pub fn status(&self) -> u16 {
        match self {
            Error::InvalidQuery(_)
            | Error::InvalidBody(_)
            | Error::InvalidAction(_)
            | Error::InvalidParameter(_) => 400,
            Error::Unauthenticated(_) => 401,
            Error::NotFound(_) | Error::RouteNotFound(_) => 404,
            Error::ServiceUnavailable(_)
            | Error::Embedding(_)
            | Error::Catalog(_)
            | Error::Favorites(_)
            | Error::Internal(_) => 500,
        }
    }

    /// Controlled errors render their message to the caller; everything else
    /// is collapsed to a fixed generic message at the dispatch boundary.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            Error::Embedding(_) | Error::Catalog(_) | Error::Favorites(_) | Error::Internal(_)
        )
    }

    /// The message shown to callers. Domain errors expose their own text,
    /// anything else stays behind the trust boundary.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidQuery(m)
            | Error::InvalidBody(m)
            | Error::InvalidAction(m)
            | Error::InvalidParameter(m)
            | Error::Unauthenticated(m)
            | Error::NotFound(m)
            | Error::RouteNotFound(m)
            | Error::ServiceUnavailable(m) => m.clone(),
            Error::Embedding(_) | Error::Catalog(_) | Error::Favorites(_) | Error::Internal(_) => {
                "internal server error".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
