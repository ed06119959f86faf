//! 输出目录写入
//!
//! 负责目标目录中的所有文件：资源文件、`index.html`、`styles.css` 和 `README.md`。
//! 文件名唯一性由 [`AssetNamer`] 保证。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::utils::naming::{AssetNamer, FallbackName};
use crate::utils::url::Url;

pub const INDEX_FILE_NAME: &str = "index.html";
pub const STYLESHEET_FILE_NAME: &str = "styles.css";
pub const README_FILE_NAME: &str = "README.md";

/// 生成 README 所需的信息
pub struct ReadmeInfo<'a> {
    pub source_url: &'a Url,
    pub cloned_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct BundleWriter {
    root: PathBuf,
    namer: AssetNamer,
    files: Vec<String>,
}

impl BundleWriter {
    /// Creates the destination directory (and parents) if needed.
    pub fn create(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root)?;

        Ok(BundleWriter {
            root: root.to_path_buf(),
            namer: AssetNamer::new(),
            files: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files written so far, in write order
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// 写入一个资源文件，返回实际使用的文件名
    pub fn write_asset(
        &mut self,
        url: &Url,
        fallback: FallbackName,
        data: &[u8],
    ) -> io::Result<String> {
        let name = self.namer.propose(url, fallback);
        fs::write(self.root.join(&name), data)?;
        self.namer.claim(&name);
        self.files.push(name.clone());

        debug!(url = %url, name = %name, bytes = data.len(), "asset written");
        Ok(name)
    }

    pub fn write_index(&mut self, html: &str) -> io::Result<()> {
        self.write_reserved(INDEX_FILE_NAME, html)
    }

    pub fn write_stylesheet(&mut self, css: &str) -> io::Result<()> {
        self.write_reserved(STYLESHEET_FILE_NAME, css)
    }

    /// README 列出写入它之前的所有文件
    pub fn write_readme(&mut self, info: &ReadmeInfo) -> io::Result<()> {
        let readme = render_readme(info, &self.files);
        self.write_reserved(README_FILE_NAME, &readme)
    }

    fn write_reserved(&mut self, name: &str, contents: &str) -> io::Result<()> {
        fs::write(self.root.join(name), contents)?;
        self.files.push(name.to_string());
        Ok(())
    }
}

/// 去掉 URL 中的用户名和密码
fn redact_credentials(url: &Url) -> Url {
    let mut clean = url.clone();
    if clean.has_authority() {
        let _ = clean.set_username("");
        let _ = clean.set_password(None);
    }
    clean
}

pub fn render_readme(info: &ReadmeInfo, files: &[String]) -> String {
    let source_url = redact_credentials(info.source_url);
    let host = source_url.host_str().unwrap_or("local file");

    let mut readme = format!(
        "# Cloned Website: {host}\n\
         \n\
         This folder contains a cloned version of {source_url}\n\
         \n\
         Cloned at: {}\n\
         \n\
         ## Files:\n\
         - `index.html` - The main HTML file\n\
         - `styles.css` - All CSS styles\n",
        info.cloned_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    );

    let mut assets: Vec<&String> = files
        .iter()
        .filter(|name| name.as_str() != INDEX_FILE_NAME && name.as_str() != STYLESHEET_FILE_NAME)
        .collect();
    assets.sort();
    for name in assets {
        readme.push_str(&format!("- `{name}`\n"));
    }

    readme.push_str(
        "\n\
         ## To view:\n\
         Open `index.html` in your web browser.\n\
         \n\
         ## Note:\n\
         This is a static clone. Interactive features may not work as expected.\n",
    );

    readme
}
