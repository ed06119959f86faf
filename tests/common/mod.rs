// 集成测试公共模块
//
// 站点夹具写在临时目录中，通过 file:// 地址由真实的 Session 读取。

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use webclone::core::CloneOptions;
use webclone::network::{PageRenderer, RenderError};
use webclone::utils::url::Url;

/// 一个本地站点夹具
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        SiteFixture {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// 写入文件（自动创建父目录），返回它的 file:// 地址
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> Url {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        Url::from_file_path(&path).unwrap()
    }

    pub fn url(&self, relative: &str) -> Url {
        Url::from_file_path(self.dir.path().join(relative)).unwrap()
    }
}

/// 不使用浏览器、输出到 `output_root` 的选项
pub fn offline_options(output_root: &Path) -> CloneOptions {
    CloneOptions {
        output_root: output_root.to_path_buf(),
        render: false,
        ..CloneOptions::default()
    }
}

pub fn read(path: PathBuf) -> String {
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// 返回固定 HTML 的渲染器，模拟脚本执行后的页面
pub struct FixedRenderer(pub String);

impl PageRenderer for FixedRenderer {
    fn render(&self, _url: &Url) -> Result<String, RenderError> {
        Ok(self.0.clone())
    }
}

/// 总是导航失败的渲染器
pub struct FailingRenderer;

impl PageRenderer for FailingRenderer {
    fn render(&self, url: &Url) -> Result<String, RenderError> {
        Err(RenderError::Navigation(format!("net::ERR_NAME_NOT_RESOLVED at {url}")))
    }
}

/// 一个包含常见资源引用的页面
pub fn write_sample_site(site: &SiteFixture) -> Url {
    site.write(
        "css/site.css",
        "body{background:url(../img/bg.jpg)}\n.card{background-image:url('../img/bg.jpg')}",
    );
    site.write("img/bg.jpg", b"bg-bytes");
    site.write("img/hero.png", b"hero-bytes");
    site.write("img/tile.png", b"tile-bytes");
    site.write("a.png", b"a-bytes");
    site.write("js/app.js", "console.log('app');");

    site.write(
        "index.html",
        r#"<!DOCTYPE html>
<html>
<head>
<title>Fixture Page</title>
<link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Inter">
<link rel="stylesheet" href="css/site.css">
<style>.hero{background:url('img/hero.png')}</style>
<script src="https://www.google-analytics.com/analytics.js"></script>
</head>
<body>
<div class="hero"><h1>Hello</h1></div>
<img data-src="a.png" alt="A">
<div style="color: red; background: url('img/tile.png') no-repeat, url(data:image/png;base64,AAAA)"></div>
<script src="js/app.js"></script>
</body>
</html>"#,
    )
}
