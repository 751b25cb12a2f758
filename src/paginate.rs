use serde::Deserialize;

/// Every listing page slices at exactly this many posts.
pub const PAGE_SIZE: i64 = 10;

/// Query-string shape shared by all paginated listings.
///
/// The parameter is kept as a raw string so that garbage input falls
/// back to the first page instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
	pub page: Option<String>,
}

impl PageQuery {
	pub fn number(&self) -> Option<i64> {
		self.page.as_deref().and_then(|page| page.parse().ok())
	}
}

/// A resolved page of a listing.
///
/// Out-of-range page numbers clamp to the nearest valid page rather
/// than erroring, so a listing always renders.
#[derive(Debug)]
pub struct Page {
	pub number: i64,
	pub pages: i64,
	pub total: i64,
}

impl Page {
	pub fn clamp(total: i64, requested: Option<i64>) -> Self {
		let pages = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
		let number = requested.unwrap_or(1).clamp(1, pages);

		Self {
			number,
			pages,
			total,
		}
	}

	pub fn limit(&self) -> i64 {
		PAGE_SIZE
	}

	pub fn offset(&self) -> i64 {
		(self.number - 1) * PAGE_SIZE
	}

	pub fn has_next(&self) -> bool {
		self.number < self.pages
	}

	pub fn has_prev(&self) -> bool {
		self.number > 1
	}
}
