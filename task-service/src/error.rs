use crate::dtos::StoreErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::bson::{self, oid};
use mongodb::error::{ErrorKind, WriteFailure};
use service_core::error::AppError;
use thiserror::Error;

/// Server code for a unique index violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Failure of a single store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Argument passed in must be a single String of 12 bytes or a string of 24 hex characters")]
    InvalidId(#[from] oid::Error),

    #[error("{0}")]
    Encoding(#[from] bson::ser::Error),

    #[error("{0}")]
    Database(#[from] mongodb::error::Error),

    #[error("E11000 duplicate key error collection: tasks index: _id_ dup key: {{ _id: {0} }}")]
    DuplicateKey(bson::Bson),

    #[error("{0}")]
    Unavailable(String),
}

impl StoreError {
    /// Error class reported in the echoed body.
    pub fn name(&self) -> &'static str {
        match self {
            StoreError::InvalidId(_) => "BSONTypeError",
            StoreError::Encoding(_) => "BSONSerializationError",
            StoreError::Database(_) | StoreError::DuplicateKey(_) => "MongoError",
            StoreError::Unavailable(_) => "StoreUnavailable",
        }
    }

    /// Server error code, when the deployment supplied one.
    pub fn code(&self) -> Option<i32> {
        let err = match self {
            StoreError::Database(err) => err,
            StoreError::DuplicateKey(_) => return Some(DUPLICATE_KEY_CODE),
            _ => return None,
        };
        match err.kind.as_ref() {
            ErrorKind::Command(command) => Some(command.code),
            ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
            ErrorKind::Write(WriteFailure::WriteConcernError(concern)) => Some(concern.code),
            _ => None,
        }
    }

    pub fn to_body(&self) -> StoreErrorBody {
        StoreErrorBody {
            name: self.name().to_string(),
            message: self.to_string(),
            code: self.code(),
        }
    }
}

/// Store failures are echoed as the body with a success status; callers
/// detect them by shape.
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.to_body())).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}
