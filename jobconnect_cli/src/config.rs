use crate::input::DEFAULT_MAX_LENGTH;
use clap::Parser;
use eyre::WrapErr;
use jobconnect_chat::{HttpTransport, RawMessage, Role, Transport, TransportDyn};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_URL_ENV: &str = "JOBCONNECT_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/chat";
pub const DEFAULT_PLACEHOLDER: &str = "Share your career goals, questions, or challenges...";
pub const DEFAULT_GREETING: &str = "Hello! How can I assist you today?";

#[derive(Parser, Debug)]
#[command(name = "jobconnect")]
#[command(about = "Career assistant chat for military spouses")]
pub struct Args {
    /// Chat endpoint; falls back to $JOBCONNECT_API_URL, then the local default
    #[arg(long)]
    pub api_url: Option<String>,

    /// Run without an endpoint; messages are not sent anywhere
    #[arg(long, conflicts_with = "api_url")]
    pub offline: bool,

    #[arg(long, default_value = DEFAULT_PLACEHOLDER)]
    pub placeholder: String,

    #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,

    /// JSON array of seed messages shown when the chat opens and after a reset
    #[arg(long)]
    pub seed_file: Option<PathBuf>,

    /// Give up on a request after this many seconds (default: wait forever)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, default_value = "jobconnect.log")]
    pub log_file: PathBuf,

    /// Load environment from .env file
    #[arg(long, default_value = "true")]
    pub dotenv: bool,

    /// Send a single message, print the reply and exit
    #[arg(long, short = 'a')]
    pub ask: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub endpoint: Option<String>,
    pub placeholder: String,
    pub max_length: usize,
    pub seed: Vec<RawMessage>,
    pub timeout: Option<Duration>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_API_URL.to_string()),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            max_length: DEFAULT_MAX_LENGTH,
            seed: default_seed(),
            timeout: None,
        }
    }
}

impl ChatConfig {
    pub fn transport(&self) -> eyre::Result<Option<Box<dyn TransportDyn>>> {
        let Some(url) = &self.endpoint else {
            return Ok(None);
        };
        let transport = HttpTransport::with_timeout(url.clone(), self.timeout)
            .wrap_err("Failed to build HTTP client")?;
        tracing::info!(url = transport.url(), timeout = ?self.timeout, "using chat endpoint");
        Ok(Some(transport.boxed()))
    }
}

impl Args {
    /// Resolves the endpoint from flags and environment (read after `.env` is loaded).
    pub fn into_config(self) -> eyre::Result<ChatConfig> {
        let endpoint = if self.offline {
            None
        } else {
            let url = self
                .api_url
                .or_else(|| std::env::var(API_URL_ENV).ok())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string());
            Some(url.trim().to_string()).filter(|url| !url.is_empty())
        };
        let seed = match &self.seed_file {
            Some(path) => load_seed(path)?,
            None => default_seed(),
        };
        Ok(ChatConfig {
            endpoint,
            placeholder: self.placeholder,
            max_length: self.max_length,
            seed,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

pub fn default_seed() -> Vec<RawMessage> {
    vec![RawMessage::new(Role::Bot, DEFAULT_GREETING)]
}

pub fn load_seed(path: &Path) -> eyre::Result<Vec<RawMessage>> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Failed to parse seed file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["jobconnect", "--api-url", "http://example.test/chat"])
            .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://example.test/chat"));
        assert_eq!(config.max_length, 500);
        assert_eq!(config.placeholder, DEFAULT_PLACEHOLDER);
        assert_eq!(config.timeout, None);
        assert_eq!(config.seed.len(), 1);
        assert_eq!(config.seed[0].content.as_deref(), Some(DEFAULT_GREETING));
        assert!(config.transport().unwrap().is_some());
    }

    #[test]
    fn test_offline_has_no_endpoint() {
        let args = Args::try_parse_from(["jobconnect", "--offline"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.endpoint, None);
        assert!(config.transport().unwrap().is_none());
    }

    #[test]
    fn test_offline_conflicts_with_url() {
        let result = Args::try_parse_from(["jobconnect", "--offline", "--api-url", "http://x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_url_means_no_endpoint() {
        let args = Args::try_parse_from(["jobconnect", "--api-url", "  "]).unwrap();
        assert_eq!(args.into_config().unwrap().endpoint, None);
    }

    #[test]
    fn test_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"type": "bot", "content": "Welcome back"}}, {{"role": "system", "content": "Be kind"}}]"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = Args::try_parse_from([
            "jobconnect",
            "--offline",
            "--seed-file",
            path.as_str(),
            "--timeout-secs",
            "30",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.seed.len(), 2);
        assert_eq!(config.seed[0].role, Some(Role::Bot));
        assert_eq!(config.seed[1].role, Some(Role::System));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_bad_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_seed(file.path()).is_err());
    }
}
