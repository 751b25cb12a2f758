use axum::extract::multipart::{Multipart, MultipartError};
use serde::Deserialize;
use validator::Validate;

use crate::Database;

/// A single field-level validation message, rendered next to the
/// offending input when the form re-renders.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldError {
	pub field: String,
	pub message: String,
}

/// Flattens [`validator::ValidationErrors`] into renderable messages.
pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
	errors
		.field_errors()
		.into_iter()
		.flat_map(|(field, errors)| {
			errors.iter().map(move |error| FieldError {
				field: field.to_string(),
				message: error
					.message
					.clone()
					.map_or_else(|| error.code.to_string(), |message| message.into_owned()),
			})
		})
		.collect()
}

/// The submitted fields of the create/edit post form.
///
/// `group` is kept as the raw selection string: empty means no group,
/// anything else must resolve to an existing group id.
#[derive(Debug, Default, Validate)]
pub struct PostInput {
	#[validate(length(min = 1, message = "enter some text"))]
	pub text: String,
	pub group: String,
}

#[derive(Debug)]
pub struct UploadedImage {
	pub file_name: String,
	pub bytes: Vec<u8>,
}

/// A parsed create/edit post submission, image payload included.
#[derive(Debug, Default)]
pub struct PostForm {
	pub input: PostInput,
	pub image: Option<UploadedImage>,
}

/// The outcome of validating a [`PostForm`] against the store.
pub struct Validated {
	pub group_id: Option<i64>,
	pub errors: Vec<FieldError>,
}

impl PostForm {
	pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
		let mut form = Self::default();

		while let Some(field) = multipart.next_field().await? {
			let name = field.name().map(ToOwned::to_owned);

			match name.as_deref() {
				Some("text") => form.input.text = field.text().await?,
				Some("group") => form.input.group = field.text().await?,
				Some("image") => {
					let file_name = field.file_name().unwrap_or("upload").to_owned();
					let bytes = field.bytes().await?;

					// Browsers submit an empty part when no file is picked
					if !bytes.is_empty() {
						form.image = Some(UploadedImage {
							file_name,
							bytes: bytes.to_vec(),
						});
					}
				}
				_ => {}
			}
		}

		Ok(form)
	}

	/// Validates the text field and resolves the group selection against
	/// the store. Nothing is persisted here; the caller stamps the author
	/// and inserts only when `errors` comes back empty.
	pub async fn validate(&self, database: &Database) -> Result<Validated, sqlx::Error> {
		let mut errors = match self.input.validate() {
			Ok(()) => Vec::new(),
			Err(errors) => field_errors(&errors),
		};

		let group_id = match self.input.group.trim() {
			"" => None,
			raw => match raw.parse::<i64>() {
				Ok(id) => {
					let known = sqlx::query_scalar::<_, i64>(
						r#"SELECT COUNT(*) FROM "group" WHERE id = ?"#,
					)
					.bind(id)
					.fetch_one(database)
					.await?;

					if known == 0 {
						errors.push(FieldError {
							field: "group".to_owned(),
							message: "select a valid group".to_owned(),
						});
						None
					} else {
						Some(id)
					}
				}
				Err(_) => {
					errors.push(FieldError {
						field: "group".to_owned(),
						message: "select a valid group".to_owned(),
					});
					None
				}
			},
		};

		Ok(Validated { group_id, errors })
	}
}

/// The add-comment form. Author and parent post are stamped by the
/// handler, never taken from the submission. `text` defaults so that a
/// body without the field deserializes and fails validation instead of
/// being rejected by the extractor.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
	#[serde(default)]
	#[validate(length(min = 1, message = "enter some text"))]
	pub text: String,
}
