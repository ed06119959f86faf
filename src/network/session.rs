//! HTTP 会话与单个资源下载
//!
//! `Session` 持有一个配置好 User-Agent 和超时的阻塞式 HTTP 客户端，
//! 同时支持读取 `file://` 资源（便于离线处理本地页面）。

use std::fs;
use std::io;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::debug;

use crate::core::{detect_media_type_by_file_name, parse_content_type, CloneOptions};
use crate::utils::url::Url;

/// 单个资源下载失败的原因
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("could not read local file: {0}")]
    Io(#[from] io::Error),

    #[error("unsupported URL scheme \"{0}\"")]
    UnsupportedScheme(String),
}

/// 下载成功的资源
#[derive(Debug, Clone)]
pub struct RetrievedAsset {
    pub data: Vec<u8>,
    /// URL after redirects
    pub final_url: Url,
    pub media_type: String,
    pub charset: String,
}

impl RetrievedAsset {
    /// Decodes the body as text using the declared charset, UTF-8 otherwise.
    pub fn text(&self) -> String {
        let encoding = encoding_rs::Encoding::for_label(self.charset.as_bytes())
            .unwrap_or(encoding_rs::UTF_8);
        let (text, _, _) = encoding.decode(&self.data);
        text.into_owned()
    }
}

/// Retrieves one resource. Implementations never panic on network errors.
pub trait AssetFetcher {
    fn retrieve_asset(&self, url: &Url) -> Result<RetrievedAsset, FetchError>;
}

pub struct Session {
    client: Client,
}

impl Session {
    pub fn new(options: &CloneOptions) -> Result<Self, FetchError> {
        Self::with_identity(&options.user_agent, options.fetch_timeout)
    }

    pub fn with_identity(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Session { client })
    }

    fn retrieve_remote(&self, url: &Url) -> Result<RetrievedAsset, FetchError> {
        let response = self.client.get(url.as_str()).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let data = response.bytes()?.to_vec();

        let (mut media_type, charset) = parse_content_type(&content_type);
        if media_type.is_empty() {
            media_type = detect_media_type_by_file_name(final_url.path());
        }

        Ok(RetrievedAsset {
            data,
            final_url,
            media_type,
            charset,
        })
    }

    fn retrieve_local(&self, url: &Url) -> Result<RetrievedAsset, FetchError> {
        let path = url.to_file_path().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot map {url} to a local path"),
            )
        })?;

        let data = fs::read(&path)?;

        Ok(RetrievedAsset {
            data,
            final_url: url.clone(),
            media_type: detect_media_type_by_file_name(url.path()),
            charset: String::new(),
        })
    }
}

impl AssetFetcher for Session {
    fn retrieve_asset(&self, url: &Url) -> Result<RetrievedAsset, FetchError> {
        debug!(url = %url, "retrieving asset");

        match url.scheme() {
            "http" | "https" => self.retrieve_remote(url),
            "file" => self.retrieve_local(url),
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}
