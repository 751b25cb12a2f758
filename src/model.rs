use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A model representing a single user.
///
/// The `email` and `password` fields never reach a template.
#[derive(Debug, Clone, FromRow)]
pub struct User {
	pub id: Uuid,
	#[allow(dead_code)]
	pub email: String,
	/// argon2, salted with `id`
	pub password: Vec<u8>,
	pub username: String,
	pub created_at: DateTime<Utc>,
}

/// A user-authored entry, optionally tagged to a group and
/// carrying an optional image.
#[derive(Debug, FromRow)]
pub struct Post {
	pub id: i64,
	pub text: Option<String>,
	/// Assigned by the server at creation and never updated after.
	pub pub_date: DateTime<Utc>,
	pub author_id: Uuid,
	pub group_id: Option<i64>,
	/// Relative media path, e.g. `posts/flower.gif`.
	pub image: Option<String>,
}

/// A named category posts may belong to. The slug is the public
/// identifier used in URLs.
#[derive(Debug, FromRow)]
pub struct Group {
	pub id: i64,
	pub title: String,
	pub slug: String,
	pub description: String,
}

#[derive(Debug, FromRow)]
pub struct Comment {
	pub id: i64,
	pub text: Option<String>,
	pub created: DateTime<Utc>,
	pub author_id: Uuid,
	pub post_id: i64,
}

/// A directed "surface this author's posts for me" relationship.
#[derive(Debug, FromRow)]
pub struct Follow {
	pub id: i64,
	pub user_id: Uuid,
	pub author_id: Uuid,
}

/// A post row joined with its author and group, as shown on listing
/// and detail pages.
#[derive(Debug, FromRow)]
pub struct PostView {
	pub id: i64,
	pub text: Option<String>,
	pub pub_date: DateTime<Utc>,
	pub author_id: Uuid,
	pub author: String,
	pub group_title: Option<String>,
	pub image: Option<String>,
}

/// A comment row joined with its author's username.
#[derive(Debug, FromRow)]
pub struct CommentView {
	pub id: i64,
	pub text: Option<String>,
	pub created: DateTime<Utc>,
	pub author: String,
}
