use axum::{
	body::Body,
	extract::{FromRef, FromRequestParts},
	http::{header, request, Response, StatusCode},
	response::IntoResponse,
};
use uuid::Uuid;

use crate::{model, route, session, Database};

/// Extracts the session and related user from the request cookie.
///
/// Protected pages take this as an argument; without a valid session
/// the request is answered with a redirect to the login page.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: model::User,
}

#[derive(Debug)]
pub enum SessionRejection {
	Unauthenticated,
	Database(sqlx::Error),
}

impl From<sqlx::Error> for SessionRejection {
	fn from(error: sqlx::Error) -> Self {
		Self::Database(error)
	}
}

impl IntoResponse for SessionRejection {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Unauthenticated => route::found("/auth/login/"),
			Self::Database(error) => {
				tracing::error!(%error, "session lookup failed");
				StatusCode::INTERNAL_SERVER_ERROR.into_response()
			}
		}
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = SessionRejection;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let cookies = parts
			.headers
			.get_all(header::COOKIE)
			.into_iter()
			.filter_map(|value| value.to_str().ok());

		let session_id = cookies
			.flat_map(cookie::Cookie::split_parse)
			.filter_map(Result::ok)
			.find(|cookie| cookie.name() == session::COOKIE_NAME)
			.ok_or(SessionRejection::Unauthenticated)?;

		let session_id = Uuid::parse_str(session_id.value())
			.map_err(|_| SessionRejection::Unauthenticated)?;

		let database = Database::from_ref(state);
		let user = sqlx::query_as::<_, model::User>(
			r#"
			SELECT id, email, password, username, created_at FROM "user" WHERE id = (
				SELECT user_id FROM session WHERE id = ?
			)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&database)
		.await?;

		let user = user.ok_or(SessionRejection::Unauthenticated)?;

		Ok(Session {
			id: session_id,
			user,
		})
	}
}
