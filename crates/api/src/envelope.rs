//! The `{success, message, data, errors}` wrapper every handler responds
//! with, success or failure alike.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }
}

impl Envelope<()> {
    pub fn err(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }
}
