use crate::error::DepotError;
use serde::Serialize;

/// The JSON envelope every endpoint answers with.
#[derive(Debug, Serialize, PartialEq)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, result: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            result: Some(result),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            result: None,
        }
    }
}

/// Maps the error taxonomy onto HTTP status codes.
///
/// Validation problems are 422, missing entities 404, scope and signature
/// failures 403, business-rule rejections 400, gateway faults 502 and
/// storage faults 500.
pub fn status_code(err: &DepotError) -> u16 {
    match err {
        DepotError::Validation(_) | DepotError::Csv(_) => 422,
        DepotError::NotFound(_) => 404,
        DepotError::Authorization(_) | DepotError::SignatureMismatch => 403,
        DepotError::InsufficientStock { .. }
        | DepotError::InsufficientPayment { .. }
        | DepotError::AlreadyProcessed
        | DepotError::InvalidTransition { .. } => 400,
        DepotError::Gateway(_) => 502,
        DepotError::Io(_) | DepotError::Persistence(_) => 500,
    }
}
