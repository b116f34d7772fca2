use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Not authenticated with the catalog service")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Catalog API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
