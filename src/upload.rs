use std::path::{Path, PathBuf};

/// All post images land under this prefix, original filename preserved.
pub const PREFIX: &str = "posts";

/// Stores uploaded images under the media root.
#[derive(Clone)]
pub struct Uploads {
	root: PathBuf,
}

impl Uploads {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Writes `bytes` under `posts/` and returns the relative path that
	/// gets persisted on the post. The suggested name is reduced to its
	/// basename so a crafted filename cannot escape the media root.
	pub async fn store(&self, suggested_name: &str, bytes: &[u8]) -> std::io::Result<String> {
		let name = Path::new(suggested_name)
			.file_name()
			.and_then(|name| name.to_str())
			.unwrap_or("upload");

		let dir = self.root.join(PREFIX);
		tokio::fs::create_dir_all(&dir).await?;
		tokio::fs::write(dir.join(name), bytes).await?;

		Ok(format!("{PREFIX}/{name}"))
	}
}
