use std::{env, str::FromStr, time::Duration};

/// Runtime configuration, read from the environment once at startup.
pub struct Config {
	pub database_url: String,
	pub port: u16,
	/// Directory uploaded images are written to and served from.
	pub media_root: String,
	/// How long a rendered index page stays valid in the response cache.
	pub cache_ttl: Duration,
}

impl Config {
	pub fn load() -> Self {
		Self {
			database_url: env::var("DATABASE_URL")
				.unwrap_or_else(|_| "sqlite://tidings.db".to_owned()),
			port: parse_var("PORT", 3000),
			media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_owned()),
			cache_ttl: Duration::from_secs(parse_var("CACHE_TTL_SECONDS", 20)),
		}
	}
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
	let Ok(value) = env::var(key) else {
		return default;
	};

	match value.parse() {
		Ok(parsed) => parsed,
		Err(_) => {
			tracing::warn!("invalid value for {key}, using the default");
			default
		}
	}
}

#[cfg(test)]
mod test {
	#[test]
	fn test_parse_var_falls_back() {
		std::env::set_var("TIDINGS_TEST_PORT", "not a number");

		assert_eq!(super::parse_var::<u16>("TIDINGS_TEST_PORT", 3000), 3000);
		assert_eq!(super::parse_var::<u16>("TIDINGS_TEST_UNSET", 8080), 8080);
	}
}
