use argon2::Argon2;
use axum::{
	body::Body,
	extract::State,
	http::{header, Response, StatusCode},
	response::{Html, IntoResponse},
	routing::get,
	Form,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
	extract::Session,
	form::{field_errors, FieldError},
	render, session, AppState, Error,
};

pub const KEY_LENGTH: usize = 32;

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new()
		.route("/signup/", get(signup_page).post(signup))
		.route("/login/", get(login_page).post(login))
		.route("/logout/", get(logout))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SignupInput {
	#[validate(
		length(min = 3, max = 16, message = "3 to 16 characters"),
		custom(function = valid_username)
	)]
	pub username: String,
	#[validate(email(message = "enter a valid email address"))]
	pub email: String,
	#[validate(length(min = 8, max = 128, message = "8 to 128 characters"))]
	pub password: String,
}

/// Usernames appear verbatim in `/profile/<username>/` links, so they
/// are limited to characters that survive a URL path segment.
fn valid_username(username: &str) -> Result<(), ValidationError> {
	let acceptable = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');

	if username.chars().all(acceptable) {
		Ok(())
	} else {
		Err(ValidationError::new("username")
			.with_message("use letters, digits, . _ or - only".into()))
	}
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginInput {
	#[validate(length(min = 1, message = "enter your username"))]
	pub username: String,
	#[validate(length(min = 1, message = "enter your password"))]
	pub password: String,
}

/// Hashes a password with Argon2, using the user's id as a salt.
/// Since this is only used for logging in and creating a new password,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

fn errors_block(errors: &[FieldError]) -> String {
	errors
		.iter()
		.map(|error| {
			format!(
				r#"<p class="error">{}: {}</p>"#,
				render::escape(&error.field),
				render::escape(&error.message)
			)
		})
		.collect()
}

fn signup_form(input: &SignupInput, errors: &[FieldError]) -> String {
	render::page(
		"Sign up",
		&format!(
			concat!(
				"<h1>Sign up</h1>{errors}",
				r#"<form method="post" action="/auth/signup/">"#,
				r#"<p><label>Username <input name="username" value="{username}"></label></p>"#,
				r#"<p><label>Email <input name="email" value="{email}"></label></p>"#,
				r#"<p><label>Password <input type="password" name="password"></label></p>"#,
				r#"<p><button type="submit">Sign up</button></p>"#,
				"</form>"
			),
			errors = errors_block(errors),
			username = render::escape(&input.username),
			email = render::escape(&input.email),
		),
	)
}

fn login_form(input: &LoginInput, errors: &[FieldError]) -> String {
	render::page(
		"Log in",
		&format!(
			concat!(
				"<h1>Log in</h1>{errors}",
				r#"<form method="post" action="/auth/login/">"#,
				r#"<p><label>Username <input name="username" value="{username}"></label></p>"#,
				r#"<p><label>Password <input type="password" name="password"></label></p>"#,
				r#"<p><button type="submit">Log in</button></p>"#,
				"</form>",
				r#"<p>No account yet? <a href="/auth/signup/">Sign up</a></p>"#
			),
			errors = errors_block(errors),
			username = render::escape(&input.username),
		),
	)
}

/// Answers with the session cookie set and a redirect to the index.
fn logged_in(session_id: Uuid) -> Response<Body> {
	let cookie = session::create_cookie(session_id);

	(
		StatusCode::FOUND,
		[
			(header::SET_COOKIE, cookie.to_string()),
			(header::LOCATION, "/".to_owned()),
		],
	)
		.into_response()
}

pub async fn signup_page() -> Html<String> {
	Html(signup_form(&SignupInput::default(), &[]))
}

pub async fn login_page() -> Html<String> {
	Html(login_form(&LoginInput::default(), &[]))
}

/// Registers a new account and logs it in right away.
pub async fn signup(
	State(state): State<AppState>,
	Form(input): Form<SignupInput>,
) -> Result<Response<Body>, Error> {
	if let Err(errors) = input.validate() {
		return Ok(Html(signup_form(&input, &field_errors(&errors))).into_response());
	}

	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &input.password, &user_id).map_err(Error::Hash)?;

	let mut tx = state.database.begin().await?;

	let inserted = sqlx::query(
		r#"INSERT INTO "user" (id, email, username, password, created_at) VALUES (?, ?, ?, ?, ?)"#,
	)
	.bind(user_id)
	.bind(&input.email)
	.bind(&input.username)
	.bind(hashed.to_vec())
	.bind(Utc::now())
	.execute(&mut *tx)
	.await;

	if let Err(error) = inserted {
		if matches!(&error, sqlx::Error::Database(e) if e.is_unique_violation()) {
			let taken = vec![FieldError {
				field: "username".to_owned(),
				message: "username or email already taken".to_owned(),
			}];

			return Ok(Html(signup_form(&input, &taken)).into_response());
		}

		return Err(error.into());
	}

	let session_id = Uuid::new_v4();
	sqlx::query("INSERT INTO session (id, user_id, created_at) VALUES (?, ?, ?)")
		.bind(session_id)
		.bind(user_id)
		.bind(Utc::now())
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;

	Ok(logged_in(session_id))
}

/// Verifies the credentials and opens a session.
pub async fn login(
	State(state): State<AppState>,
	Form(input): Form<LoginInput>,
) -> Result<Response<Body>, Error> {
	if let Err(errors) = input.validate() {
		return Ok(Html(login_form(&input, &field_errors(&errors))).into_response());
	}

	let rejected = || {
		let errors = vec![FieldError {
			field: "password".to_owned(),
			message: "invalid username or password".to_owned(),
		}];

		Html(login_form(&input, &errors)).into_response()
	};

	let user = sqlx::query_as::<_, crate::model::User>(
		r#"SELECT id, email, password, username, created_at FROM "user" WHERE username = ?"#,
	)
	.bind(&input.username)
	.fetch_optional(&state.database)
	.await?;

	let Some(user) = user else {
		return Ok(rejected());
	};

	let hashed = hash_password(&state.hasher, &input.password, &user.id).map_err(Error::Hash)?;

	if user.password != hashed {
		return Ok(rejected());
	}

	let session_id = Uuid::new_v4();
	sqlx::query("INSERT INTO session (id, user_id, created_at) VALUES (?, ?, ?)")
		.bind(session_id)
		.bind(user.id)
		.bind(Utc::now())
		.execute(&state.database)
		.await?;

	Ok(logged_in(session_id))
}

/// Logs out of the authenticated account.
pub async fn logout(
	State(state): State<AppState>,
	session: Session,
) -> Result<Response<Body>, Error> {
	sqlx::query("DELETE FROM session WHERE id = ?")
		.bind(session.id)
		.execute(&state.database)
		.await?;

	// Clear the session cookie
	Ok((
		StatusCode::FOUND,
		[
			(header::SET_COOKIE, session::clear_cookie().to_string()),
			(header::LOCATION, "/".to_owned()),
		],
	)
		.into_response())
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_signup_flow(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/auth/signup/")
			.form(&[
				("username", "john"),
				("email", "john@smith.com"),
				("password", "hunter2hunter"),
			])
			.await;

		assert_eq!(response.status_code(), 302);
		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		// the fresh session opens protected pages
		let response = app.get("/create/").await;
		assert_eq!(response.status_code(), 200);
	}

	#[sqlx::test]
	async fn test_login_flow(pool: Database) {
		let app = app(pool);
		signup(&app, "john").await;

		let response = app.get("/auth/logout/").await;
		assert_eq!(response.status_code(), 302);

		let response = app.get("/create/").await;
		assert_eq!(response.status_code(), 302);

		let response = app
			.post("/auth/login/")
			.form(&[("username", "john"), ("password", "hunter2hunter")])
			.await;

		assert_eq!(response.status_code(), 302);

		let response = app.get("/create/").await;
		assert_eq!(response.status_code(), 200);
	}

	#[sqlx::test]
	async fn test_login_rejects_wrong_password(pool: Database) {
		let app = app(pool);
		signup(&app, "john").await;
		app.get("/auth/logout/").await;

		let response = app
			.post("/auth/login/")
			.form(&[("username", "john"), ("password", "wrong-password")])
			.await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("invalid username or password"));
	}

	#[sqlx::test]
	async fn test_signup_rejects_unsafe_username(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/auth/signup/")
			.form(&[
				("username", "no/slashes"),
				("email", "john@smith.com"),
				("password", "hunter2hunter"),
			])
			.await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("use letters, digits, . _ or - only"));

		let response = app
			.post("/auth/signup/")
			.form(&[
				("username", "spaced out?"),
				("email", "john@smith.com"),
				("password", "hunter2hunter"),
			])
			.await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("use letters, digits, . _ or - only"));
	}

	#[sqlx::test]
	async fn test_signup_rejects_taken_username(pool: Database) {
		let app = app(pool);
		signup(&app, "john").await;
		app.get("/auth/logout/").await;

		let response = app
			.post("/auth/signup/")
			.form(&[
				("username", "john"),
				("email", "other@smith.com"),
				("password", "hunter2hunter"),
			])
			.await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("already taken"));
	}
}
