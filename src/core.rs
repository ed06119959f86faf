use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use markup5ever_rcdom::Handle;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::builders::bundle::{BundleWriter, ReadmeInfo};
use crate::env::EnvError;
use crate::network::renderer::{PageRenderer, RenderError, StaticRenderer};
use crate::network::session::{AssetFetcher, FetchError, Session};
use crate::parsers::css::{format_css, CssFormat};
use crate::parsers::html::assets::{AssetLocalizer, AssetRewriter};
use crate::parsers::html::dom::parse_html;
use crate::parsers::html::metadata::{get_base_url, get_title, strip_for_snapshot};
use crate::parsers::html::serializer::{beautify_html, HtmlFormat};
use crate::parsers::html::styles::resolve_styles;
use crate::utils::url::{default_folder_name, resolve_url, Url};

/// Desktop Chrome on macOS
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Job-level failures. Nothing is written to disk when rendering fails.
#[derive(Error, Debug)]
pub enum CloneError {
    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("could not set up HTTP client: {0}")]
    Network(#[from] FetchError),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Config(#[from] EnvError),
}

/// Configuration options for a clone run
#[derive(Clone, Debug)]
pub struct CloneOptions {
    /// Directory receiving the clone folders
    pub output_root: PathBuf,
    pub user_agent: String,
    /// Per-asset timeout
    pub fetch_timeout: Duration,
    /// Use the headless browser (falls back to a plain fetch when disabled)
    pub render: bool,
    pub render_timeout: Duration,
    /// Wait after scrolling so lazy loaders can fire
    pub settle_delay: Duration,
    pub viewport: (u32, u32),
    pub chrome_path: Option<PathBuf>,
    pub indent_size: usize,
    pub wrap_line_length: usize,
}

impl Default for CloneOptions {
    fn default() -> Self {
        CloneOptions {
            output_root: PathBuf::from("."),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(10),
            render: true,
            render_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(3000),
            viewport: (1920, 1080),
            chrome_path: None,
            indent_size: 2,
            wrap_line_length: 120,
        }
    }
}

/// 一次克隆任务的输入，创建后不再修改
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloneJob {
    pub source_url: Url,
    /// Folder name under [`CloneOptions::output_root`]
    pub destination: String,
}

impl CloneJob {
    pub fn new(url: &str, folder: Option<&str>) -> Result<Self, CloneError> {
        let url = url.trim();
        let source_url = Url::parse(url).map_err(|e| CloneError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(source_url.scheme(), "http" | "https" | "file") {
            return Err(CloneError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme \"{}\"", source_url.scheme()),
            });
        }

        let destination = match folder.map(str::trim) {
            Some(folder) if !folder.is_empty() => folder.to_string(),
            _ => default_folder_name(&source_url),
        };

        Ok(CloneJob {
            source_url,
            destination,
        })
    }
}

/// 资源类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Image,
    Background,
    Vector,
    Stylesheet,
    CssResource,
    Script,
    Icon,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AssetStatus {
    Ok { local_name: String },
    Skipped { reason: String },
    Failed { error: String },
}

/// 单个资源引用的处理结果
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssetOutcome {
    pub kind: AssetKind,
    pub origin: String,
    #[serde(flatten)]
    pub status: AssetStatus,
}

impl AssetOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, AssetStatus::Ok { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, AssetStatus::Failed { .. })
    }
}

/// Structured result of a successful clone
#[derive(Clone, Debug, Serialize)]
pub struct CloneReport {
    pub source_url: String,
    pub folder: String,
    pub output_dir: PathBuf,
    pub title: Option<String>,
    pub cloned_at: String,
    /// Every file written, in write order
    pub files: Vec<String>,
    pub outcomes: Vec<AssetOutcome>,
}

impl CloneReport {
    pub fn downloaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn outcomes_of(&self, kind: AssetKind) -> impl Iterator<Item = &AssetOutcome> {
        self.outcomes.iter().filter(move |o| o.kind == kind)
    }
}

/// 克隆流水线：渲染 → 解析 → 清理 → 样式汇总 → 资源本地化 → 写出
pub struct ClonePipeline<'a> {
    renderer: &'a dyn PageRenderer,
    fetcher: &'a dyn AssetFetcher,
    options: &'a CloneOptions,
}

impl<'a> ClonePipeline<'a> {
    pub fn new(
        renderer: &'a dyn PageRenderer,
        fetcher: &'a dyn AssetFetcher,
        options: &'a CloneOptions,
    ) -> Self {
        Self {
            renderer,
            fetcher,
            options,
        }
    }

    pub fn run(&self, job: &CloneJob) -> Result<CloneReport, CloneError> {
        // 1. 渲染页面；失败时不创建任何文件
        info!(url = %job.source_url, "rendering page");
        let html = self.renderer.render(&job.source_url)?;

        // 2. 解析并确定基础URL
        let dom = parse_html(&html);
        let base_url = determine_base_url(&dom.document, &job.source_url);
        let title = get_title(&dom.document);

        // 3. 移除统计脚本等节点，保证它们不会被下载
        let stripped = strip_for_snapshot(&dom.document);
        debug!(count = stripped, "stripped tracking and refresh nodes");

        let output_dir = self.options.output_root.join(&job.destination);
        let mut bundle = BundleWriter::create(&output_dir)?;
        info!(dir = %output_dir.display(), "writing bundle");

        // 4. 汇总样式并本地化资源
        let mut localizer = AssetLocalizer::new(self.fetcher, &mut bundle);
        let mut styles = resolve_styles(&dom, &base_url, &mut localizer);
        info!(segments = styles.segments().len(), "collected stylesheets");

        let mut rewriter = AssetRewriter::new(&base_url, &mut localizer);
        rewriter.localize_images(&dom.document);
        rewriter.localize_backgrounds(&dom.document);
        rewriter.localize_vectors(&dom.document);
        rewriter.localize_stylesheet_resources(&mut styles);
        rewriter.localize_scripts(&dom.document);
        rewriter.localize_icons(&dom.document);
        let outcomes = localizer.into_outcomes();

        // 5. 格式化并写出
        let html = beautify_html(
            &dom,
            &HtmlFormat {
                indent_size: self.options.indent_size,
                wrap_line_length: self.options.wrap_line_length,
            },
        )?;
        let css = format_css(
            &styles.to_css(),
            &CssFormat {
                indent_size: self.options.indent_size,
                wrap_line_length: self.options.wrap_line_length,
            },
        );

        let cloned_at = Utc::now();
        bundle.write_index(&html)?;
        bundle.write_stylesheet(&css)?;
        bundle.write_readme(&ReadmeInfo {
            source_url: &job.source_url,
            cloned_at,
        })?;

        let report = CloneReport {
            source_url: job.source_url.to_string(),
            folder: job.destination.clone(),
            output_dir,
            title,
            cloned_at: cloned_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            files: bundle.files().to_vec(),
            outcomes,
        };

        if report.failed() > 0 {
            warn!(
                failed = report.failed(),
                total = report.outcomes.len(),
                "some assets could not be downloaded"
            );
        }
        info!(
            files = report.files.len(),
            assets = report.downloaded(),
            "clone complete"
        );

        Ok(report)
    }
}

/// `<base href>` overrides the page URL for resolving relative references
fn determine_base_url(document: &Handle, source_url: &Url) -> Url {
    get_base_url(document)
        .and_then(|href| resolve_url(source_url, &href))
        .unwrap_or_else(|| source_url.clone())
}

/// Runs the pipeline with explicit collaborators.
pub fn create_static_bundle(
    job: &CloneJob,
    renderer: &dyn PageRenderer,
    fetcher: &dyn AssetFetcher,
    options: &CloneOptions,
) -> Result<CloneReport, CloneError> {
    ClonePipeline::new(renderer, fetcher, options).run(job)
}

/// Clones `url` with the default collaborators chosen from `options`.
pub fn clone_site(
    url: &str,
    folder: Option<&str>,
    options: &CloneOptions,
) -> Result<CloneReport, CloneError> {
    let job = CloneJob::new(url, folder)?;
    let session = Session::new(options)?;

    #[cfg(feature = "headless")]
    {
        if options.render {
            let renderer = crate::network::renderer::HeadlessRenderer::new(options.into());
            return create_static_bundle(&job, &renderer, &session, options);
        }
    }

    #[cfg(not(feature = "headless"))]
    {
        if options.render {
            warn!("built without the headless feature, fetching the page without rendering");
        }
    }

    let renderer = StaticRenderer::new(&session);
    create_static_bundle(&job, &renderer, &session, options)
}

/// 克隆网站并返回可读的结果描述；不会 panic，也不会返回错误
pub fn clone_website(url: &str, folder: Option<&str>, options: &CloneOptions) -> String {
    match clone_site(url, folder, options) {
        Ok(report) => success_message(&report.folder),
        Err(e) => {
            error!("clone failed: {e}");
            failure_message(&e)
        }
    }
}

pub fn success_message(folder: &str) -> String {
    format!(
        "Website cloned successfully! Files saved in ./{folder}/ including index.html, \
         styles.css, JavaScript files, and all assets."
    )
}

pub fn failure_message(error: &CloneError) -> String {
    format!("Error cloning website: {error}")
}

// All known non-"text/..." plaintext media types
const PLAINTEXT_MEDIA_TYPES: &[&str] = &[
    "application/javascript",          // .js
    "application/json",                // .json
    "application/ld+json",             // .jsonld
    "application/x-sh",                // .sh
    "application/xhtml+xml",           // .xhtml
    "application/xml",                 // .xml
    "application/vnd.mozilla.xul+xml", // .xul
    "image/svg+xml",                   // .svg
];

const MEDIA_TYPES_BY_EXTENSION: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".htm", "text/html"),
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".mjs", "application/javascript"),
    (".json", "application/json"),
    (".svg", "image/svg+xml"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
    (".webp", "image/webp"),
    (".avif", "image/avif"),
    (".ico", "image/x-icon"),
    (".woff", "font/woff"),
    (".woff2", "font/woff2"),
    (".ttf", "font/ttf"),
    (".otf", "font/otf"),
    (".mp3", "audio/mpeg"),
    (".ogg", "audio/ogg"),
    (".wav", "audio/wav"),
    (".mp4", "video/mp4"),
    (".webm", "video/webm"),
];

/// Determines the media type based on file extension
pub fn detect_media_type_by_file_name(filename: &str) -> String {
    let filename_lowercased = filename.to_lowercase();

    MEDIA_TYPES_BY_EXTENSION
        .iter()
        .find(|(extension, _)| filename_lowercased.ends_with(extension))
        .map(|(_, media_type)| media_type.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Parses a Content-Type header value into media type and charset
pub fn parse_content_type(content_type: &str) -> (String, String) {
    let mut parts = content_type.split(';');
    let media_type = parts.next().unwrap_or_default().trim().to_lowercase();
    let mut charset = String::new();

    for part in parts {
        let part = part.trim();
        if let Some(value) = part
            .get(..8)
            .filter(|key| key.eq_ignore_ascii_case("charset="))
            .map(|_| &part[8..])
        {
            charset = value.trim_matches('"').to_string();
        }
    }

    (media_type, charset)
}

/// Checks if the given media type represents plaintext content
pub fn is_plaintext_media_type(media_type: &str) -> bool {
    media_type.starts_with("text/") || PLAINTEXT_MEDIA_TYPES.contains(&media_type)
}
