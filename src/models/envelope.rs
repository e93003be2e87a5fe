use serde::Deserialize;
use serde_json::Value;

use super::drink::Drink;

/// The JSON wrapper every drinks API response uses.
///
/// Successful list/create/update responses carry `drinks`; failures carry
/// `error` (usually the status code) and a human readable `message`. Only
/// the fields the store acts on are read, anything else in the body is
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub drinks: Vec<Drink>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    /// Best effort description of a failed response.
    pub fn failure_message(&self) -> String {
        match (&self.message, &self.error) {
            (Some(message), _) => message.clone(),
            (None, Some(Value::String(error))) => error.clone(),
            (None, Some(Value::Null)) | (None, None) => "request was not successful".to_string(),
            (None, Some(error)) => format!("request failed with error {}", error),
        }
    }
}
