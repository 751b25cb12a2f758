use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use axum::http::Uri;

/// Time-bound whole-response cache for the index page.
///
/// Keys are the request path plus query string, so every page number of
/// the listing is a distinct entry. Within the window the stored body is
/// returned verbatim even if the underlying data changed; there is no
/// manual invalidation.
#[derive(Clone)]
pub struct PageCache {
	ttl: Duration,
	entries: Arc<Mutex<HashMap<String, Entry>>>,
}

struct Entry {
	body: String,
	expires_at: Instant,
}

/// Cache key for a request: normalized path plus query string.
pub fn key(uri: &Uri) -> String {
	match uri.query() {
		Some(query) => format!("{}?{query}", uri.path()),
		None => uri.path().to_owned(),
	}
}

impl PageCache {
	pub fn new(ttl: Duration) -> Self {
		Self {
			ttl,
			entries: Arc::new(Mutex::new(HashMap::new())),
		}
	}

	/// Returns the stored body for `key` if it has not expired yet.
	/// Expired entries are dropped on access.
	pub fn get(&self, key: &str) -> Option<String> {
		let mut entries = self.entries.lock().unwrap();

		match entries.get(key) {
			Some(entry) if entry.expires_at > Instant::now() => Some(entry.body.clone()),
			Some(_) => {
				entries.remove(key);
				None
			}
			None => None,
		}
	}

	/// Stores a body under `key`. Expired entries are swept here so that
	/// keys which never recur (stray query strings and the like) cannot
	/// pile up in the map.
	pub fn put(&self, key: String, body: String) {
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap();

		entries.retain(|_, entry| entry.expires_at > now);
		entries.insert(
			key,
			Entry {
				body,
				expires_at: now + self.ttl,
			},
		);
	}
}

#[cfg(test)]
mod test {
	use std::time::Duration;

	use super::{key, PageCache};

	#[test]
	fn test_round_trip_within_window() {
		let cache = PageCache::new(Duration::from_secs(60));

		cache.put("/".to_owned(), "<p>hello</p>".to_owned());

		assert_eq!(cache.get("/").as_deref(), Some("<p>hello</p>"));
		assert_eq!(cache.get("/?page=2"), None);
	}

	#[test]
	fn test_entries_expire() {
		let cache = PageCache::new(Duration::from_millis(30));

		cache.put("/".to_owned(), "stale".to_owned());
		assert!(cache.get("/").is_some());

		std::thread::sleep(Duration::from_millis(50));
		assert_eq!(cache.get("/"), None);
	}

	#[test]
	fn test_put_sweeps_expired_entries() {
		let cache = PageCache::new(Duration::from_millis(10));

		for n in 0..100 {
			cache.put(format!("/?junk={n}"), "stale".to_owned());
		}

		std::thread::sleep(Duration::from_millis(30));
		cache.put("/".to_owned(), "fresh".to_owned());

		assert_eq!(cache.entries.lock().unwrap().len(), 1);
		assert_eq!(cache.get("/").as_deref(), Some("fresh"));
	}

	#[test]
	fn test_key_includes_query() {
		let uri: axum::http::Uri = "http://localhost/?page=2".parse().unwrap();
		assert_eq!(key(&uri), "/?page=2");

		let uri: axum::http::Uri = "/".parse().unwrap();
		assert_eq!(key(&uri), "/");
	}
}
