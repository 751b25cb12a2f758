use axum::{
	body::Body,
	http::{Response, StatusCode},
	response::{Html, IntoResponse},
};

use crate::{
	form::{FieldError, PostInput},
	model::{CommentView, Group, PostView},
	paginate::Page,
};

pub fn escape(text: &str) -> String {
	html_escape::encode_text(text).into_owned()
}

/// Wraps rendered content in the base layout.
pub fn page(title: &str, content: &str) -> String {
	include_str!("html/base.html")
		.replace("/*style*/", include_str!("html/style.css"))
		.replace("<!--title-->", &escape(title))
		.replace("<!--content-->", content)
}

pub fn not_found() -> Response<Body> {
	(
		StatusCode::NOT_FOUND,
		Html(page(
			"Not found",
			"<h1>404</h1><p>There is no such page.</p>",
		)),
	)
		.into_response()
}

pub fn post_card(post: &PostView) -> String {
	let group = post.group_title.as_deref().map_or_else(String::new, |title| {
		format!(" in <b>{}</b>", escape(title))
	});

	let image = post.image.as_deref().map_or_else(String::new, |path| {
		format!(r#"<img src="/media/{}" alt="">"#, escape(path))
	});

	format!(
		concat!(
			r#"<article class="post">"#,
			r#"<p class="meta"><a href="/profile/{author}/">{author}</a>"#,
			r#" on {date}{group} &middot; <a href="/posts/{id}/">permalink</a></p>"#,
			"{image}<p>{text}</p></article>"
		),
		author = escape(&post.author),
		date = post.pub_date.format("%Y-%m-%d %H:%M"),
		group = group,
		id = post.id,
		image = image,
		text = escape(post.text.as_deref().unwrap_or("")),
	)
}

fn pagination(page: &Page, base: &str) -> String {
	let mut nav = String::from(r#"<nav class="pages">"#);

	if page.has_prev() {
		nav.push_str(&format!(
			r#"<a href="{base}?page={}">previous</a> "#,
			page.number - 1
		));
	}

	nav.push_str(&format!(
		"<span>page {} of {} &middot; {} posts</span>",
		page.number, page.pages, page.total
	));

	if page.has_next() {
		nav.push_str(&format!(
			r#" <a href="{base}?page={}">next</a>"#,
			page.number + 1
		));
	}

	nav.push_str("</nav>");
	nav
}

/// A paginated run of post cards with its navigation links. `base` is
/// the listing's own path, used to build the page links.
pub fn post_list(posts: &[PostView], page: &Page, base: &str) -> String {
	let cards = posts.iter().map(post_card).collect::<String>();

	format!("{cards}{}", pagination(page, base))
}

fn errors_for(field: &str, errors: &[FieldError]) -> String {
	errors
		.iter()
		.filter(|error| error.field == field)
		.map(|error| format!(r#"<p class="error">{}</p>"#, escape(&error.message)))
		.collect()
}

/// The create/edit post form, pre-filled with the submitted (or stored)
/// values and annotated with field-level errors.
pub fn post_form(
	action: &str,
	input: &PostInput,
	groups: &[Group],
	errors: &[FieldError],
	is_edit: bool,
) -> String {
	let options = groups
		.iter()
		.map(|group| {
			let selected = if input.group == group.id.to_string() {
				" selected"
			} else {
				""
			};

			format!(
				r#"<option value="{}"{selected}>{}</option>"#,
				group.id,
				escape(&group.title)
			)
		})
		.collect::<String>();

	format!(
		concat!(
			r#"<h1>{heading}</h1>"#,
			r#"<form method="post" action="{action}" enctype="multipart/form-data">"#,
			"{text_errors}",
			r#"<p><label>Text<br><textarea name="text">{text}</textarea></label></p>"#,
			"{group_errors}",
			r#"<p><label>Group<br><select name="group">"#,
			r#"<option value="">---------</option>{options}"#,
			"</select></label></p>",
			r#"<p><label>Image <input type="file" name="image"></label></p>"#,
			r#"<p><button type="submit">{heading}</button></p>"#,
			"</form>"
		),
		heading = if is_edit { "Save post" } else { "Add post" },
		action = action,
		text_errors = errors_for("text", errors),
		text = escape(&input.text),
		group_errors = errors_for("group", errors),
		options = options,
	)
}

/// Existing comments plus the empty add-comment form for a post page.
pub fn comments(post_id: i64, comments: &[CommentView]) -> String {
	let list = comments
		.iter()
		.map(|comment| {
			format!(
				concat!(
					r#"<article class="comment"><p class="meta">"#,
					r#"<a href="/profile/{author}/">{author}</a> on {date}</p>"#,
					"<p>{text}</p></article>"
				),
				author = escape(&comment.author),
				date = comment.created.format("%Y-%m-%d %H:%M"),
				text = escape(comment.text.as_deref().unwrap_or("")),
			)
		})
		.collect::<String>();

	format!(
		concat!(
			"<h2>Comments</h2>{list}",
			r#"<form method="post" action="/posts/{id}/comment/">"#,
			r#"<p><label>Text<br><textarea name="text"></textarea></label></p>"#,
			r#"<p><button type="submit">Send</button></p>"#,
			"</form>"
		),
		list = list,
		id = post_id,
	)
}
