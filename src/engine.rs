use async_trait::async_trait;
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
    process::Stdio,
    time::Instant,
};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("rendering engine unavailable: {0}")]
    Unavailable(io::Error),
    #[error("failed to start rendering engine: {0}")]
    Spawn(io::Error),
    #[error("rendering engine failed (exit {exit_code:?}): {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("rendering engine produced no output")]
    EmptyOutput,
}

impl EngineError {
    /// Whether the engine could not even be started, as opposed to failing
    /// while assembling the document.
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Spawn(_))
    }
}

/// Page options handed to the engine for every document. Pages are always
/// portrait.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub dpi: u32,
    pub grayscale: bool,
    /// Footer text on the right; `[page]` is substituted by the engine.
    pub footer_right: String,
    pub footer_font_size: u32,
    pub zoom: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            dpi: 72,
            grayscale: false,
            footer_right: "[page]".into(),
            footer_font_size: 10,
            zoom: 0.95,
        }
    }
}

impl PageLayout {
    fn global_args(&self) -> Vec<String> {
        let mut args = vec![
            "--dpi".into(),
            self.dpi.to_string(),
            "--orientation".into(),
            "Portrait".into(),
        ];
        if self.grayscale {
            args.push("--grayscale".into());
        }
        args
    }

    fn page_args(&self) -> Vec<String> {
        vec![
            "--footer-right".into(),
            self.footer_right.clone(),
            "--footer-font-size".into(),
            self.footer_font_size.to_string(),
            "--zoom".into(),
            self.zoom.to_string(),
        ]
    }
}

/// Something that turns an address into a finished document.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn render(&self, source: &Url, layout: &PageLayout) -> Result<Vec<u8>, EngineError>;
}

/// Runs the `wkhtmltopdf` binary and collects the PDF from its stdout.
#[derive(Debug, Clone)]
pub struct Wkhtmltopdf {
    path: PathBuf,
}

impl Wkhtmltopdf {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Engine for Wkhtmltopdf {
    async fn render(&self, source: &Url, layout: &PageLayout) -> Result<Vec<u8>, EngineError> {
        let started_at = Instant::now();

        // The child is killed if this future is dropped, e.g. on timeout.
        let output = Command::new(&self.path)
            .arg("--quiet")
            .args(layout.global_args())
            .arg(source.as_str())
            .args(layout.page_args())
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                warn!(
                    op = "engine::render",
                    result = "error",
                    engine = %self.path.display(),
                    error = %err,
                    "Failed to spawn rendering engine"
                );
                if err.kind() == ErrorKind::NotFound {
                    EngineError::Unavailable(err)
                } else {
                    EngineError::Spawn(err)
                }
            })?;

        if !output.status.success() {
            let exit_code = output.status.code();
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                op = "engine::render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                exit_code = exit_code.unwrap_or(-1),
                stderr = %stderr,
                "Rendering engine exited unsuccessfully"
            );
            return Err(EngineError::Failed { exit_code, stderr });
        }

        if output.stdout.is_empty() {
            return Err(EngineError::EmptyOutput);
        }

        debug!(
            op = "engine::render",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            bytes = output.stdout.len(),
            "Rendering engine finished"
        );
        Ok(output.stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{fs, os::unix::fs::PermissionsExt, path::Path};
    use tempfile::TempDir;

    fn fake_engine(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-wkhtmltopdf");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn source() -> Url {
        Url::parse("http://localhost:3000/static/page.html").unwrap()
    }

    #[test]
    fn default_layout_args() {
        let layout = PageLayout::default();
        assert_eq!(
            layout.global_args(),
            ["--dpi", "72", "--orientation", "Portrait"]
        );
        assert_eq!(
            layout.page_args(),
            [
                "--footer-right",
                "[page]",
                "--footer-font-size",
                "10",
                "--zoom",
                "0.95"
            ]
        );
    }

    #[test]
    fn grayscale_adds_flag() {
        let layout = PageLayout {
            grayscale: true,
            ..PageLayout::default()
        };
        assert_eq!(
            layout.global_args(),
            ["--dpi", "72", "--orientation", "Portrait", "--grayscale"]
        );
    }

    #[tokio::test]
    async fn collects_stdout_and_passes_layout() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("args.log");
        let script = fake_engine(
            dir.path(),
            &format!("printf '%s\\n' \"$@\" > {}\nprintf '%%PDF-1.4 fake'", log.display()),
        );

        let pdf = Wkhtmltopdf::new(&script)
            .render(&source(), &PageLayout::default())
            .await
            .unwrap();
        assert_eq!(pdf, b"%PDF-1.4 fake");

        let args = fs::read_to_string(&log).unwrap();
        let args: Vec<&str> = args.lines().collect();
        assert_eq!(
            args,
            [
                "--quiet",
                "--dpi",
                "72",
                "--orientation",
                "Portrait",
                "http://localhost:3000/static/page.html",
                "--footer-right",
                "[page]",
                "--footer-font-size",
                "10",
                "--zoom",
                "0.95",
                "-",
            ]
        );
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let script = fake_engine(dir.path(), "echo 'host not found' >&2\nexit 1");

        let err = Wkhtmltopdf::new(&script)
            .render(&source(), &PageLayout::default())
            .await
            .unwrap_err();
        match err {
            EngineError::Failed { exit_code, stderr } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "host not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_output_is_an_error() {
        let dir = TempDir::new().unwrap();
        let script = fake_engine(dir.path(), "exit 0");

        let err = Wkhtmltopdf::new(&script)
            .render(&source(), &PageLayout::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyOutput));
        assert!(!err.is_construction());
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = Wkhtmltopdf::new(dir.path().join("nope"))
            .render(&source(), &PageLayout::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)));
        assert!(err.is_construction());
    }
}
