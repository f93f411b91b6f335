//! Wire shapes of the Solr collections and update APIs.

use serde::Deserialize;
use solr_sink::{SinkError, UpdateRequest};

/// Response of `admin/collections?action=LIST`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListCollectionsResponse {
    #[serde(default)]
    pub collections: Vec<String>,
}

/// Error envelope Solr attaches to failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<ErrorBody>,
    /// Collections API reports per-node failures here with a 200 status.
    pub failure: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub msg: Option<String>,
    pub code: Option<u16>,
}

/// Best-effort human message from an error response body.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            error: Some(ErrorBody { msg: Some(msg), .. }),
            ..
        }) => msg,
        Ok(ErrorResponse {
            failure: Some(failure),
            ..
        }) => failure.to_string(),
        _ => body.chars().take(200).collect(),
    }
}

/// Body for a single update request: an array of documents for adds,
/// `{"delete": [ids]}` for deletes.
pub fn update_body(request: &UpdateRequest) -> Result<String, SinkError> {
    let body = match request {
        UpdateRequest::Add(docs) => serde_json::to_string(docs)?,
        UpdateRequest::Delete(ids) => serde_json::to_string(&serde_json::json!({ "delete": ids }))?,
    };
    Ok(body)
}

/// Ordered command stream for several requests in one body.
///
/// Solr applies the commands of a JSON update body in document order, and
/// the format relies on repeated `add`/`delete` keys, so it is written by
/// hand rather than through a map.
pub fn command_stream(requests: &[UpdateRequest]) -> Result<String, SinkError> {
    let mut body = String::from("{");
    let mut first = true;
    for request in requests {
        match request {
            UpdateRequest::Add(docs) => {
                for doc in docs {
                    if !first {
                        body.push(',');
                    }
                    first = false;
                    body.push_str(&format!("\"add\":{{\"doc\":{}}}", serde_json::to_string(doc)?));
                }
            }
            UpdateRequest::Delete(ids) => {
                if ids.is_empty() {
                    continue;
                }
                if !first {
                    body.push(',');
                }
                first = false;
                body.push_str(&format!("\"delete\":{}", serde_json::to_string(ids)?));
            }
        }
    }
    body.push('}');
    Ok(body)
}
