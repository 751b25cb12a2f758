#![warn(clippy::pedantic)]

mod admin;
mod cache;
mod config;
mod error;
mod extract;
mod form;
mod model;
mod paginate;
mod render;
mod route;
mod session;
mod upload;


use std::str::FromStr;

use argon2::Argon2;
use axum::{
	routing::{get, post},
	Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use error::Error;

pub type Database = sqlx::Pool<sqlx::Sqlite>;
pub type AppState = State;

/// The shared application state.
///
/// This holds everything handlers need access to: the connection pool,
/// the password hash configuration, the whole-response cache for the
/// index page and the media store for uploaded images.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub cache: cache::PageCache,
	pub uploads: upload::Uploads,
}

pub fn router(state: State) -> Router {
	let media = ServeDir::new(state.uploads.root().to_owned());

	Router::new()
		.route("/", get(route::posts::index))
		.route("/group/:slug/", get(route::posts::group_posts))
		.route("/profile/:username/", get(route::posts::profile))
		.route(
			"/profile/:username/follow/",
			get(route::posts::profile_follow),
		)
		.route(
			"/profile/:username/unfollow/",
			get(route::posts::profile_unfollow),
		)
		.route("/posts/:post_id/", get(route::posts::post_detail))
		.route(
			"/posts/:post_id/edit/",
			get(route::posts::post_edit_page).post(route::posts::post_edit),
		)
		.route("/posts/:post_id/comment/", post(route::posts::add_comment))
		.route(
			"/create/",
			get(route::posts::post_create_page).post(route::posts::post_create),
		)
		.route("/follow/", get(route::posts::follow_index))
		.route("/about/author/", get(route::about::author))
		.route("/about/tech/", get(route::about::tech))
		.nest("/auth", route::auth::routes())
		.nest_service("/media", media)
		.fallback(route::not_found)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

#[tokio::main]
async fn main() {
	tracing_subscriber::fmt::init();
	dotenvy::dotenv().ok();

	let config = config::Config::load();

	let options = sqlx::sqlite::SqliteConnectOptions::from_str(&config.database_url)
		.expect("DATABASE_URL must be a valid sqlite url")
		.create_if_missing(true);

	let database = Database::connect_with(options)
		.await
		.expect("failed to open database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let state = State {
		database,
		hasher: Argon2::default(),
		cache: cache::PageCache::new(config.cache_ttl),
		uploads: upload::Uploads::new(&config.media_root),
	};

	let app = router(state);

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", config.port);

	axum::serve(listener, app).await.unwrap();
}
