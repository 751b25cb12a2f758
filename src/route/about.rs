use axum::response::Html;

use crate::render;

/// Static page about the site's author.
pub async fn author() -> Html<String> {
	Html(render::page(
		"About the author",
		concat!(
			"<h1>About the author</h1>",
			"<p>Tidings is a hobby project: a small place to write, ",
			"follow other authors and argue in the comments.</p>",
			r#"<p>Back to the <a href="/">index</a>.</p>"#,
		),
	))
}

/// Static page about the technology behind the site.
pub async fn tech() -> Html<String> {
	Html(render::page(
		"Technologies",
		concat!(
			"<h1>Technologies</h1>",
			"<ul>",
			"<li>axum for routing and request handling</li>",
			"<li>sqlx with SQLite for storage</li>",
			"<li>argon2 password hashing with cookie sessions</li>",
			"</ul>",
		),
	))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_static_pages_render(pool: Database) {
		let app = app(pool);

		let response = app.get("/about/author/").await;
		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("About the author"));

		let response = app.get("/about/tech/").await;
		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("Technologies"));
	}
}
