use axum::{
	body::Body,
	extract::multipart::MultipartError,
	http::{Response, StatusCode},
	response::IntoResponse,
};

use crate::render;

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("not found")]
	NotFound,
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("multipart error: {0}")]
	Multipart(#[from] MultipartError),
	#[error("upload error: {0}")]
	Upload(#[from] std::io::Error),
	#[error("password hash error: {0}")]
	Hash(argon2::Error),
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		match self {
			Error::NotFound => render::not_found(),
			Error::Multipart(error) => {
				(StatusCode::BAD_REQUEST, error.to_string()).into_response()
			}
			error => {
				tracing::error!(%error, "request failed");
				StatusCode::INTERNAL_SERVER_ERROR.into_response()
			}
		}
	}
}
