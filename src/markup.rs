use crate::{error::Error, STATIC_MOUNT};
use std::path::PathBuf;
use tracing::info;
use url::Url;

/// Writes inline markup into the served directory so the engine can fetch it
/// by address.
#[derive(Debug, Clone)]
pub struct Materializer {
    output_dir: PathBuf,
    public_url: Url,
}

impl Materializer {
    /// `public_url` is the base the engine reaches this server on and must
    /// end with a `/`.
    pub fn new(output_dir: impl Into<PathBuf>, public_url: Url) -> Self {
        Self {
            output_dir: output_dir.into(),
            public_url,
        }
    }

    pub async fn materialize(&self, markup: &str, stem: &str) -> Result<Url, Error> {
        let file_name = format!("{stem}.html");
        let path = self.output_dir.join(&file_name);

        tokio::fs::write(&path, markup)
            .await
            .map_err(Error::MarkupWrite)?;

        let address = self
            .public_url
            .join(&format!("{STATIC_MOUNT}/{file_name}"))
            .map_err(|err| Error::InvalidAddress(err.to_string()))?;

        info!(
            op = "markup::materialize",
            path = %path.display(),
            address = %address,
            bytes = markup.len(),
            "Markup written"
        );
        Ok(address)
    }
}
