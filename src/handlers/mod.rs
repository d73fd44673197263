pub mod health;
pub mod documents;
pub mod sessions;
mod json;

pub use health::*;
pub use documents::*;
pub use sessions::*;
pub use json::JsonRequest;

use tracing::error;
use uuid::Uuid;

use crate::error::ColabError;

/// Parse a document id path segment
pub(crate) fn parse_doc_id(doc_id: &str) -> Result<Uuid, ColabError> {
    Uuid::parse_str(doc_id).map_err(|e| {
        error!("Invalid document UUID '{}': {}", doc_id, e);
        ColabError::InvalidArgument(format!("Invalid document UUID '{}'", doc_id))
    })
}
