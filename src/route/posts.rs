use axum::{
	body::Body,
	extract::{Multipart, OriginalUri, Path, Query, State},
	http::Response,
	response::{Html, IntoResponse},
	Form,
};
use chrono::Utc;
use validator::Validate;

use super::found;
use crate::{
	cache,
	extract::Session,
	form::{CommentInput, PostForm},
	model,
	paginate::{Page, PageQuery},
	render, AppState, Database, Error,
};

async fn fetch_post(database: &Database, id: i64) -> Result<Option<model::Post>, sqlx::Error> {
	sqlx::query_as::<_, model::Post>(
		"SELECT id, text, pub_date, author_id, group_id, image FROM post WHERE id = ?",
	)
	.bind(id)
	.fetch_optional(database)
	.await
}

async fn fetch_user(
	database: &Database,
	username: &str,
) -> Result<Option<model::User>, sqlx::Error> {
	sqlx::query_as::<_, model::User>(
		r#"SELECT id, email, password, username, created_at FROM "user" WHERE username = ?"#,
	)
	.bind(username)
	.fetch_optional(database)
	.await
}

async fn all_groups(database: &Database) -> Result<Vec<model::Group>, sqlx::Error> {
	sqlx::query_as::<_, model::Group>(
		r#"SELECT id, title, slug, description FROM "group" ORDER BY title"#,
	)
	.fetch_all(database)
	.await
}

/// Lists every post, newest first. The whole rendered body is cached
/// per path and query string, so each page number is its own entry and
/// deletions stay invisible until the window expires.
pub async fn index(
	State(state): State<AppState>,
	OriginalUri(uri): OriginalUri,
	Query(query): Query<PageQuery>,
) -> Result<Response<Body>, Error> {
	let key = cache::key(&uri);

	if let Some(body) = state.cache.get(&key) {
		return Ok(Html(body).into_response());
	}

	let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post")
		.fetch_one(&state.database)
		.await?;

	let page = Page::clamp(total, query.number());

	let posts = sqlx::query_as::<_, model::PostView>(
		r#"
		SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author,
		       g.title AS group_title, p.image
		FROM post p
		JOIN "user" u ON u.id = p.author_id
		LEFT JOIN "group" g ON g.id = p.group_id
		ORDER BY p.pub_date DESC, p.id DESC
		LIMIT ? OFFSET ?
		"#,
	)
	.bind(page.limit())
	.bind(page.offset())
	.fetch_all(&state.database)
	.await?;

	let body = render::page(
		"Latest updates",
		&format!(
			"<h1>Latest updates</h1>{}",
			render::post_list(&posts, &page, "/")
		),
	);

	state.cache.put(key, body.clone());

	Ok(Html(body).into_response())
}

/// Lists a group's posts, resolved by slug.
pub async fn group_posts(
	State(state): State<AppState>,
	Path(slug): Path<String>,
	Query(query): Query<PageQuery>,
) -> Result<Html<String>, Error> {
	let group = sqlx::query_as::<_, model::Group>(
		r#"SELECT id, title, slug, description FROM "group" WHERE slug = ?"#,
	)
	.bind(&slug)
	.fetch_optional(&state.database)
	.await?
	.ok_or(Error::NotFound)?;

	let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post WHERE group_id = ?")
		.bind(group.id)
		.fetch_one(&state.database)
		.await?;

	let page = Page::clamp(total, query.number());

	let posts = sqlx::query_as::<_, model::PostView>(
		r#"
		SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author,
		       g.title AS group_title, p.image
		FROM post p
		JOIN "user" u ON u.id = p.author_id
		LEFT JOIN "group" g ON g.id = p.group_id
		WHERE p.group_id = ?
		ORDER BY p.pub_date DESC, p.id DESC
		LIMIT ? OFFSET ?
		"#,
	)
	.bind(group.id)
	.bind(page.limit())
	.bind(page.offset())
	.fetch_all(&state.database)
	.await?;

	let title = format!("Posts in {}", group.title);
	let body = render::page(
		&title,
		&format!(
			"<h1>{}</h1><p>{}</p>{}",
			render::escape(&title),
			render::escape(&group.description),
			render::post_list(&posts, &page, &format!("/group/{}/", group.slug)),
		),
	);

	Ok(Html(body))
}

/// An author's page: their posts, their total post count and the
/// follow/unfollow controls.
pub async fn profile(
	State(state): State<AppState>,
	Path(username): Path<String>,
	Query(query): Query<PageQuery>,
) -> Result<Html<String>, Error> {
	let author = fetch_user(&state.database, &username)
		.await?
		.ok_or(Error::NotFound)?;

	let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post WHERE author_id = ?")
		.bind(author.id)
		.fetch_one(&state.database)
		.await?;

	let page = Page::clamp(total, query.number());

	let posts = sqlx::query_as::<_, model::PostView>(
		r#"
		SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author,
		       g.title AS group_title, p.image
		FROM post p
		JOIN "user" u ON u.id = p.author_id
		LEFT JOIN "group" g ON g.id = p.group_id
		WHERE p.author_id = ?
		ORDER BY p.pub_date DESC, p.id DESC
		LIMIT ? OFFSET ?
		"#,
	)
	.bind(author.id)
	.bind(page.limit())
	.bind(page.offset())
	.fetch_all(&state.database)
	.await?;

	// The flag reflects whether the profile owner follows anyone, not
	// whether the viewer follows them.
	let following = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follow WHERE user_id = ?")
		.bind(author.id)
		.fetch_one(&state.database)
		.await? > 0;

	let controls = if following {
		format!(
			r#"<p><a href="/profile/{}/unfollow/">Unfollow</a></p>"#,
			render::escape(&author.username)
		)
	} else {
		format!(
			r#"<p><a href="/profile/{}/follow/">Follow</a></p>"#,
			render::escape(&author.username)
		)
	};

	let body = render::page(
		&author.username,
		&format!(
			"<h1>{}</h1><p class=\"meta\">joined {}</p><p>{total} posts</p>{controls}{}",
			render::escape(&author.username),
			author.created_at.format("%Y-%m-%d"),
			render::post_list(&posts, &page, &format!("/profile/{}/", author.username)),
		),
	);

	Ok(Html(body))
}

/// A single post with its comments and the empty comment form.
pub async fn post_detail(
	State(state): State<AppState>,
	Path(post_id): Path<i64>,
) -> Result<Html<String>, Error> {
	let post = sqlx::query_as::<_, model::PostView>(
		r#"
		SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author,
		       g.title AS group_title, p.image
		FROM post p
		JOIN "user" u ON u.id = p.author_id
		LEFT JOIN "group" g ON g.id = p.group_id
		WHERE p.id = ?
		"#,
	)
	.bind(post_id)
	.fetch_optional(&state.database)
	.await?
	.ok_or(Error::NotFound)?;

	let author_posts =
		sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post WHERE author_id = ?")
			.bind(post.author_id)
			.fetch_one(&state.database)
			.await?;

	let comments = sqlx::query_as::<_, model::CommentView>(
		r#"
		SELECT c.id, c.text, c.created, u.username AS author
		FROM comment c
		JOIN "user" u ON u.id = c.author_id
		WHERE c.post_id = ?
		ORDER BY c.created, c.id
		"#,
	)
	.bind(post_id)
	.fetch_all(&state.database)
	.await?;

	let title = format!("Post by {}", post.author);
	let body = render::page(
		&title,
		&format!(
			"{}<p>{author_posts} posts by <a href=\"/profile/{author}/\">{author}</a></p>{}",
			render::post_card(&post),
			render::comments(post_id, &comments),
			author = render::escape(&post.author),
		),
	);

	Ok(Html(body))
}

/// The empty create-post form.
pub async fn post_create_page(
	State(state): State<AppState>,
	_session: Session,
) -> Result<Html<String>, Error> {
	let groups = all_groups(&state.database).await?;
	let form = PostForm::default();

	Ok(Html(render::page(
		"New post",
		&render::post_form("/create/", &form.input, &groups, &[], false),
	)))
}

/// Validates the submission; on success stamps the author, persists and
/// redirects to the author's profile. On failure the form re-renders
/// with field errors, HTTP 200, nothing saved.
pub async fn post_create(
	State(state): State<AppState>,
	session: Session,
	multipart: Multipart,
) -> Result<Response<Body>, Error> {
	let form = PostForm::from_multipart(multipart).await?;
	let validated = form.validate(&state.database).await?;

	if !validated.errors.is_empty() {
		let groups = all_groups(&state.database).await?;
		let body = render::page(
			"New post",
			&render::post_form("/create/", &form.input, &groups, &validated.errors, false),
		);

		return Ok(Html(body).into_response());
	}

	let image = match &form.image {
		Some(image) => Some(state.uploads.store(&image.file_name, &image.bytes).await?),
		None => None,
	};

	sqlx::query(
		"INSERT INTO post (text, pub_date, author_id, group_id, image) VALUES (?, ?, ?, ?, ?)",
	)
	.bind(&form.input.text)
	.bind(Utc::now())
	.bind(session.user.id)
	.bind(validated.group_id)
	.bind(image)
	.execute(&state.database)
	.await?;

	Ok(found(&format!("/profile/{}/", session.user.username)))
}

/// The edit form, pre-filled from the stored post. Only the author may
/// edit; anyone else is sent back to the post page.
pub async fn post_edit_page(
	State(state): State<AppState>,
	session: Session,
	Path(post_id): Path<i64>,
) -> Result<Response<Body>, Error> {
	let post = fetch_post(&state.database, post_id)
		.await?
		.ok_or(Error::NotFound)?;

	if post.author_id != session.user.id {
		return Ok(found(&format!("/posts/{post_id}/")));
	}

	let groups = all_groups(&state.database).await?;
	let mut form = PostForm::default();
	form.input.text = post.text.unwrap_or_default();
	form.input.group = post.group_id.map(|id| id.to_string()).unwrap_or_default();

	let current_image = post.image.as_deref().map_or_else(String::new, |path| {
		format!("<p class=\"meta\">Currently: {}</p>", render::escape(path))
	});

	let body = render::page(
		"Edit post",
		&format!(
			"<p class=\"meta\">published {}</p>{current_image}{}",
			post.pub_date.format("%Y-%m-%d %H:%M"),
			render::post_form(
				&format!("/posts/{}/edit/", post.id),
				&form.input,
				&groups,
				&[],
				true,
			),
		),
	);

	Ok(Html(body).into_response())
}

/// Applies an edit: text and group always update, a fresh upload
/// replaces the image, and `pub_date` never changes.
pub async fn post_edit(
	State(state): State<AppState>,
	session: Session,
	Path(post_id): Path<i64>,
	multipart: Multipart,
) -> Result<Response<Body>, Error> {
	let post = fetch_post(&state.database, post_id)
		.await?
		.ok_or(Error::NotFound)?;

	if post.author_id != session.user.id {
		return Ok(found(&format!("/posts/{post_id}/")));
	}

	let form = PostForm::from_multipart(multipart).await?;
	let validated = form.validate(&state.database).await?;

	if !validated.errors.is_empty() {
		let groups = all_groups(&state.database).await?;
		let body = render::page(
			"Edit post",
			&render::post_form(
				&format!("/posts/{post_id}/edit/"),
				&form.input,
				&groups,
				&validated.errors,
				true,
			),
		);

		return Ok(Html(body).into_response());
	}

	let image = match &form.image {
		Some(image) => Some(state.uploads.store(&image.file_name, &image.bytes).await?),
		None => None,
	};

	sqlx::query("UPDATE post SET text = ?, group_id = ?, image = COALESCE(?, image) WHERE id = ?")
		.bind(&form.input.text)
		.bind(validated.group_id)
		.bind(image)
		.bind(post_id)
		.execute(&state.database)
		.await?;

	Ok(found(&format!("/posts/{post_id}/")))
}

/// Attaches a comment to a post. Invalid input is dropped without
/// feedback; the redirect to the post page happens either way.
pub async fn add_comment(
	State(state): State<AppState>,
	session: Session,
	Path(post_id): Path<i64>,
	Form(input): Form<CommentInput>,
) -> Result<Response<Body>, Error> {
	fetch_post(&state.database, post_id)
		.await?
		.ok_or(Error::NotFound)?;

	if input.validate().is_ok() {
		sqlx::query("INSERT INTO comment (text, created, author_id, post_id) VALUES (?, ?, ?, ?)")
			.bind(&input.text)
			.bind(Utc::now())
			.bind(session.user.id)
			.bind(post_id)
			.execute(&state.database)
			.await?;
	}

	Ok(found(&format!("/posts/{post_id}/")))
}

/// Lists posts authored by anyone the current user follows.
pub async fn follow_index(
	State(state): State<AppState>,
	session: Session,
	Query(query): Query<PageQuery>,
) -> Result<Html<String>, Error> {
	let total = sqlx::query_scalar::<_, i64>(
		r#"
		SELECT COUNT(*) FROM post
		WHERE author_id IN (SELECT author_id FROM follow WHERE user_id = ?)
		"#,
	)
	.bind(session.user.id)
	.fetch_one(&state.database)
	.await?;

	let page = Page::clamp(total, query.number());

	let posts = sqlx::query_as::<_, model::PostView>(
		r#"
		SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author,
		       g.title AS group_title, p.image
		FROM post p
		JOIN "user" u ON u.id = p.author_id
		LEFT JOIN "group" g ON g.id = p.group_id
		WHERE p.author_id IN (SELECT author_id FROM follow WHERE user_id = ?)
		ORDER BY p.pub_date DESC, p.id DESC
		LIMIT ? OFFSET ?
		"#,
	)
	.bind(session.user.id)
	.bind(page.limit())
	.bind(page.offset())
	.fetch_all(&state.database)
	.await?;

	let body = render::page(
		"My feed",
		&format!(
			"<h1>My feed</h1>{}",
			render::post_list(&posts, &page, "/follow/")
		),
	);

	Ok(Html(body))
}

/// Starts following an author. Following yourself is rejected here and
/// a second follow of the same author is ignored by the unique
/// constraint, so the pair exists at most once.
pub async fn profile_follow(
	State(state): State<AppState>,
	session: Session,
	Path(username): Path<String>,
) -> Result<Response<Body>, Error> {
	let author = fetch_user(&state.database, &username)
		.await?
		.ok_or(Error::NotFound)?;

	if author.id != session.user.id {
		sqlx::query("INSERT OR IGNORE INTO follow (user_id, author_id) VALUES (?, ?)")
			.bind(session.user.id)
			.bind(author.id)
			.execute(&state.database)
			.await?;
	}

	Ok(found(&format!("/profile/{username}/")))
}

/// Stops following an author. Deleting a follow that does not exist is
/// a no-op; the redirect to the index happens either way.
pub async fn profile_unfollow(
	State(state): State<AppState>,
	session: Session,
	Path(username): Path<String>,
) -> Result<Response<Body>, Error> {
	let author = fetch_user(&state.database, &username)
		.await?
		.ok_or(Error::NotFound)?;

	sqlx::query("DELETE FROM follow WHERE user_id = ? AND author_id = ?")
		.bind(session.user.id)
		.bind(author.id)
		.execute(&state.database)
		.await?;

	Ok(found("/"))
}
