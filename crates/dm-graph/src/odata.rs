//! OData envelopes returned by the graph API

use serde::Deserialize;
use serde_json::Value;

/// One page of a collection
#[derive(Debug, Deserialize)]
pub struct ODataResponse<T> {
    #[serde(default)]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Error envelope
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "innerError")]
    pub inner_error: Option<Value>,
}

impl ODataError {
    /// Parse an error body, falling back to the raw text
    pub fn parse(body: &str) -> ODataErrorBody {
        match serde_json::from_str::<ODataError>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => ODataErrorBody {
                code: String::new(),
                message: body.trim().chars().take(500).collect(),
                inner_error: None,
            },
        }
    }
}
