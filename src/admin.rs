//! Declarative listing configuration for the administrative interface.
//!
//! Each entity describes which fields a tabular admin view shows, which
//! are inline-editable, searchable or filterable. The descriptors carry
//! no behavior of their own; [`EntityAdmin`] is the generic listing
//! component that consumes them.

use crate::render;

#[derive(Debug)]
pub struct FieldDescriptor {
	pub name: &'static str,
	pub editable: bool,
	pub searchable: bool,
	pub filterable: bool,
}

const fn field(name: &'static str) -> FieldDescriptor {
	FieldDescriptor {
		name,
		editable: false,
		searchable: false,
		filterable: false,
	}
}

/// Listing configuration for one entity.
#[derive(Debug)]
pub struct EntityAdmin {
	pub entity: &'static str,
	/// Placeholder shown for missing values.
	pub empty_value: &'static str,
	pub fields: &'static [FieldDescriptor],
}

/// One listed record: values aligned with the entity's fields, `None`
/// rendering as the empty-value placeholder.
pub type Row = Vec<Option<String>>;

pub const POST: EntityAdmin = EntityAdmin {
	entity: "post",
	empty_value: "-empty-",
	fields: &[
		field("id"),
		FieldDescriptor {
			searchable: true,
			..field("text")
		},
		FieldDescriptor {
			filterable: true,
			..field("pub_date")
		},
		field("author"),
		FieldDescriptor {
			editable: true,
			..field("group")
		},
	],
};

pub const GROUP: EntityAdmin = EntityAdmin {
	entity: "group",
	empty_value: "-empty-",
	fields: &[
		field("id"),
		FieldDescriptor {
			searchable: true,
			..field("title")
		},
		field("slug"),
		field("description"),
	],
};

pub const COMMENT: EntityAdmin = EntityAdmin {
	entity: "comment",
	empty_value: "-empty-",
	fields: &[
		FieldDescriptor {
			searchable: true,
			..field("post")
		},
		FieldDescriptor {
			searchable: true,
			..field("author")
		},
		FieldDescriptor {
			searchable: true,
			filterable: true,
			..field("text")
		},
		FieldDescriptor {
			filterable: true,
			..field("created")
		},
	],
};

pub const FOLLOW: EntityAdmin = EntityAdmin {
	entity: "follow",
	empty_value: "-empty-",
	fields: &[
		FieldDescriptor {
			searchable: true,
			filterable: true,
			..field("user")
		},
		FieldDescriptor {
			searchable: true,
			filterable: true,
			..field("author")
		},
	],
};

impl EntityAdmin {
	pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.fields.iter().map(|field| field.name)
	}

	fn position(&self, name: &str) -> Option<usize> {
		self.fields.iter().position(|field| field.name == name)
	}

	/// Whether a row matches a search term over the searchable fields.
	pub fn matches(&self, row: &Row, term: &str) -> bool {
		self.fields.iter().zip(row).any(|(field, value)| {
			field.searchable
				&& value
					.as_deref()
					.is_some_and(|value| value.contains(term))
		})
	}

	/// Keeps the rows whose filterable field `name` equals `value`.
	/// An unknown or non-filterable field filters nothing out.
	pub fn filter<'r>(&self, rows: &'r [Row], name: &str, value: &str) -> Vec<&'r Row> {
		let position = self
			.position(name)
			.filter(|&position| self.fields[position].filterable);

		rows.iter()
			.filter(|row| {
				position.map_or(true, |position| {
					row[position].as_deref() == Some(value)
				})
			})
			.collect()
	}

	/// Renders rows as an HTML table, substituting the empty-value
	/// placeholder for missing cells.
	pub fn render(&self, rows: &[Row]) -> String {
		let head = self
			.columns()
			.map(|name| format!("<th>{name}</th>"))
			.collect::<String>();

		let body = rows
			.iter()
			.map(|row| {
				let cells = row
					.iter()
					.map(|value| {
						format!(
							"<td>{}</td>",
							render::escape(value.as_deref().unwrap_or(self.empty_value))
						)
					})
					.collect::<String>();

				format!("<tr>{cells}</tr>")
			})
			.collect::<String>();

		format!(
			r#"<table class="admin-{}"><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table>"#,
			self.entity
		)
	}
}
