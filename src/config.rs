use clap::{Parser, ValueEnum};
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};
use thiserror::Error;
use url::Url;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_OUTPUT_DIR: &str = "public";
const DEFAULT_ENGINE_PATH: &str = "wkhtmltopdf";
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Command-line arguments; every flag falls back to an environment variable.
#[derive(Debug, Parser)]
#[command(name = "wkpdf", version, about = "Render HTML or URLs to PDF over HTTP")]
pub struct CliArgs {
    /// Address to listen on.
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Base URL the rendering engine uses to reach this server.
    /// Defaults to `http://localhost:<port>/`.
    #[arg(long = "public-url", env = "PUBLIC_URL", value_name = "URL")]
    pub public_url: Option<Url>,

    /// Directory holding generated markup and PDFs, served under `/static`.
    #[arg(long = "output-dir", env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    #[arg(
        long = "wkhtmltopdf-path",
        env = "WKHTMLTOPDF_PATH",
        default_value = DEFAULT_ENGINE_PATH
    )]
    pub engine_path: PathBuf,

    /// Upper bound on a single engine run, in seconds.
    #[arg(
        long = "render-timeout-secs",
        env = "RENDER_TIMEOUT_SECS",
        default_value_t = DEFAULT_RENDER_TIMEOUT_SECS
    )]
    pub render_timeout_secs: u64,

    #[arg(
        long = "log-format",
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact
    )]
    pub log_format: LogFormat,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("public url `{0}` cannot be used as a base")]
    PublicUrl(String),
    #[error("render timeout must be at least one second")]
    RenderTimeout,
}

/// Settings fixed at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen: SocketAddr,
    /// Always ends with `/`.
    pub public_url: Url,
    pub output_dir: PathBuf,
    pub engine_path: PathBuf,
    pub render_timeout: Duration,
}

impl Config {
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let public_url = match &args.public_url {
            Some(url) => url.clone(),
            None => Url::parse(&format!("http://localhost:{}/", args.port))
                .map_err(|err| ConfigError::PublicUrl(err.to_string()))?,
        };
        if public_url.cannot_be_a_base() {
            return Err(ConfigError::PublicUrl(public_url.to_string()));
        }

        if args.render_timeout_secs == 0 {
            return Err(ConfigError::RenderTimeout);
        }

        Ok(Self {
            listen: SocketAddr::new(args.host, args.port),
            public_url: with_trailing_slash(public_url),
            output_dir: args.output_dir.clone(),
            engine_path: args.engine_path.clone(),
            render_timeout: Duration::from_secs(args.render_timeout_secs),
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        let base = ["wkpdf", "--host", "0.0.0.0", "--port", "8080"];
        CliArgs::try_parse_from(base.iter().chain(args.iter()).copied()).unwrap()
    }

    #[test]
    fn defaults() {
        let config = Config::from_args(&parse(&[])).unwrap();
        assert_eq!(config.listen, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.public_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.output_dir, PathBuf::from("public"));
        assert_eq!(config.render_timeout, Duration::from_secs(60));
    }

    #[test]
    fn public_url_gains_trailing_slash() {
        let config = Config::from_args(&parse(&[
            "--public-url",
            "https://pdf.example.com/api",
        ]))
        .unwrap();
        assert_eq!(config.public_url.as_str(), "https://pdf.example.com/api/");
    }

    #[test]
    fn rejects_unusable_settings() {
        let args = parse(&["--public-url", "mailto:ops@example.com"]);
        assert!(matches!(
            Config::from_args(&args),
            Err(ConfigError::PublicUrl(_))
        ));

        let args = parse(&["--render-timeout-secs", "0"]);
        assert_eq!(Config::from_args(&args), Err(ConfigError::RenderTimeout));
    }

    #[test]
    fn log_format_values() {
        let args = parse(&["--log-format", "json"]);
        assert_eq!(args.log_format, LogFormat::Json);
    }
}
