pub mod about;
pub mod auth;
pub mod posts;

use axum::{
	body::Body,
	http::{header, Response, StatusCode},
	response::IntoResponse,
};

use crate::render;

/// Plain 302 response. axum's `Redirect` helper only produces
/// 303/307/308, and the form flows here answer with classic found
/// redirects.
pub fn found(location: &str) -> Response<Body> {
	(StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// Fallback for unmatched paths.
pub async fn not_found() -> Response<Body> {
	render::not_found()
}
