use crate::{
    engine::{Engine, PageLayout},
    error::Error,
    STATIC_MOUNT,
};
use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use url::Url;

/// A document that made it to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub path: PathBuf,
    /// Path relative to the server root, e.g. `static/<stem>.pdf`.
    pub relative_path: String,
    pub bytes: usize,
}

#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn Engine>,
    layout: PageLayout,
    output_dir: PathBuf,
    timeout: Duration,
}

impl Renderer {
    pub fn new(
        engine: Arc<dyn Engine>,
        output_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            layout: PageLayout::default(),
            output_dir: output_dir.into(),
            timeout,
        }
    }

    /// Renders `source` and stores it as `<stem>.pdf`.
    ///
    /// Nothing is left under the final name unless the whole document was
    /// written.
    pub async fn render(&self, source: &Url, stem: &str) -> Result<Rendered, Error> {
        let started_at = Instant::now();

        let render = self.engine.render(source, &self.layout);
        let document = tokio::time::timeout(self.timeout, render)
            .await
            .map_err(|_| {
                warn!(
                    op = "render::render",
                    result = "timeout",
                    source = %source,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Rendering engine timed out"
                );
                Error::Timeout(self.timeout)
            })??;

        let file_name = format!("{stem}.pdf");
        let path = self.output_dir.join(&file_name);
        let bytes = document.len();
        write_into_place(self.output_dir.clone(), path.clone(), document).await?;

        info!(
            op = "render::render",
            result = "ok",
            source = %source,
            path = %path.display(),
            bytes,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Document rendered"
        );

        Ok(Rendered {
            path,
            relative_path: format!("{STATIC_MOUNT}/{file_name}"),
            bytes,
        })
    }
}

/// Writes into a hidden, randomly named temp file next to `path` and renames
/// it into place. The temp file is removed if any step fails.
async fn write_into_place(dir: PathBuf, path: PathBuf, contents: Vec<u8>) -> Result<(), Error> {
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut file = tempfile::Builder::new()
            .prefix(".")
            .suffix(".part")
            .tempfile_in(&dir)?;
        file.write_all(&contents)?;
        file.flush()?;
        file.persist(&path).map_err(|err| err.error)?;
        Ok(())
    })
    .await
    .map_err(|err| Error::OutputWrite(io::Error::new(io::ErrorKind::Other, err)))?
    .map_err(Error::OutputWrite)
}
