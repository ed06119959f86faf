//! 统一的环境变量管理系统
//!
//! 每个变量是一个实现 [`EnvVar`] 的类型：名称、默认值、说明和解析规则放在一起，
//! 由 [`EnvConfig::from_env`] 汇总后转换为 [`CloneOptions`]。

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::{CloneOptions, DEFAULT_USER_AGENT};

/// 环境变量解析错误
#[derive(Debug, Clone, Error)]
#[error("Environment variable '{variable}': {message}")]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "WEBCLONE_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 资源下载相关环境变量
pub mod fetch {
    use super::*;

    /// 请求使用的浏览器标识
    pub struct UserAgent;
    impl EnvVar<String> for UserAgent {
        const NAME: &'static str = "WEBCLONE_USER_AGENT";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "User-Agent sent by the browser and the asset fetcher";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(DEFAULT_USER_AGENT.to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let value = value.trim();
            if value.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "User-Agent cannot be empty".to_string(),
                });
            }
            Ok(value.to_string())
        }
    }

    /// 单个资源的超时
    pub struct Timeout;
    impl EnvVar<Duration> for Timeout {
        const NAME: &'static str = "WEBCLONE_FETCH_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(10));
        const DESCRIPTION: &'static str = "Per-asset download timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 300)
        }
    }
}

/// 无头浏览器相关环境变量
pub mod render {
    use super::*;

    /// 是否使用无头浏览器
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "WEBCLONE_RENDER_ENABLED";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str =
            "Render pages in a headless browser; when disabled the raw HTML is fetched";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 导航与网络空闲等待的超时
    pub struct Timeout;
    impl EnvVar<Duration> for Timeout {
        const NAME: &'static str = "WEBCLONE_RENDER_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "Navigation timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 600)
        }
    }

    /// 滚动到底部后的等待时间
    pub struct SettleDelay;
    impl EnvVar<Duration> for SettleDelay {
        const NAME: &'static str = "WEBCLONE_SETTLE_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(3000));
        const DESCRIPTION: &'static str =
            "Milliseconds to wait after scrolling so lazy content can load";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis = parse_positive_usize(value, Self::NAME, 0, 60_000)?;
            Ok(Duration::from_millis(millis as u64))
        }
    }

    pub struct ViewportWidth;
    impl EnvVar<u32> for ViewportWidth {
        const NAME: &'static str = "WEBCLONE_VIEWPORT_WIDTH";
        const DEFAULT: Option<u32> = Some(1920);
        const DESCRIPTION: &'static str = "Browser viewport width in pixels";

        fn parse(value: &str) -> EnvResult<u32> {
            Ok(parse_positive_usize(value, Self::NAME, 320, 7680)? as u32)
        }
    }

    pub struct ViewportHeight;
    impl EnvVar<u32> for ViewportHeight {
        const NAME: &'static str = "WEBCLONE_VIEWPORT_HEIGHT";
        const DEFAULT: Option<u32> = Some(1080);
        const DESCRIPTION: &'static str = "Browser viewport height in pixels";

        fn parse(value: &str) -> EnvResult<u32> {
            Ok(parse_positive_usize(value, Self::NAME, 240, 4320)? as u32)
        }
    }

    /// 浏览器可执行文件路径；未设置时自动查找
    pub struct ChromePath;
    impl EnvVar<PathBuf> for ChromePath {
        const NAME: &'static str = "WEBCLONE_CHROME_PATH";
        const DEFAULT: Option<PathBuf> = None;
        const DESCRIPTION: &'static str = "Path to the Chrome/Chromium executable";

        fn parse(value: &str) -> EnvResult<PathBuf> {
            let value = value.trim();
            if value.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(PathBuf::from(value))
        }
    }
}

/// 输出相关环境变量
pub mod output {
    use super::*;

    /// 存放克隆目录的根目录
    pub struct Root;
    impl EnvVar<PathBuf> for Root {
        const NAME: &'static str = "WEBCLONE_OUTPUT_ROOT";
        const DEFAULT: Option<PathBuf> = None;
        const DESCRIPTION: &'static str = "Directory that receives the clone folders";

        fn get() -> EnvResult<PathBuf> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(PathBuf::from(".")),
            }
        }

        fn parse(value: &str) -> EnvResult<PathBuf> {
            if value.trim().is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(PathBuf::from(value.trim()))
        }
    }

    pub struct IndentSize;
    impl EnvVar<usize> for IndentSize {
        const NAME: &'static str = "WEBCLONE_INDENT_SIZE";
        const DEFAULT: Option<usize> = Some(2);
        const DESCRIPTION: &'static str = "Indentation width of the formatted HTML and CSS";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 8)
        }
    }

    pub struct WrapLineLength;
    impl EnvVar<usize> for WrapLineLength {
        const NAME: &'static str = "WEBCLONE_WRAP_LINE_LENGTH";
        const DEFAULT: Option<usize> = Some(120);
        const DESCRIPTION: &'static str = "Column at which formatted output is wrapped";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 40, 1000)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_seconds(value: &str, var_name: &str, max: u64) -> EnvResult<Duration> {
    let seconds: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of seconds".to_string(),
    })?;

    if seconds == 0 {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Timeout must be greater than 0".to_string(),
        });
    }

    if seconds > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Timeout too long (max {} seconds)", max),
        });
    }

    Ok(Duration::from_secs(seconds))
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    // 核心配置
    pub log_level: String,
    pub no_color: bool,

    // 下载配置
    pub user_agent: String,
    pub fetch_timeout: Duration,

    // 渲染配置
    pub render_enabled: bool,
    pub render_timeout: Duration,
    pub settle_delay: Duration,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_path: Option<PathBuf>,

    // 输出配置
    pub output_root: PathBuf,
    pub indent_size: usize,
    pub wrap_line_length: usize,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: core::LogLevel::get()?,
            no_color: core::NoColor::get()?,

            user_agent: fetch::UserAgent::get()?,
            fetch_timeout: fetch::Timeout::get()?,

            render_enabled: render::Enabled::get()?,
            render_timeout: render::Timeout::get()?,
            settle_delay: render::SettleDelay::get()?,
            viewport_width: render::ViewportWidth::get()?,
            viewport_height: render::ViewportHeight::get()?,
            chrome_path: optional::<render::ChromePath, _>()?,

            output_root: output::Root::get()?,
            indent_size: output::IndentSize::get()?,
            wrap_line_length: output::WrapLineLength::get()?,
        })
    }

    /// 转换为克隆任务的选项
    pub fn to_options(&self) -> CloneOptions {
        CloneOptions {
            output_root: self.output_root.clone(),
            user_agent: self.user_agent.clone(),
            fetch_timeout: self.fetch_timeout,
            render: self.render_enabled,
            render_timeout: self.render_timeout,
            settle_delay: self.settle_delay,
            viewport: (self.viewport_width, self.viewport_height),
            chrome_path: self.chrome_path.clone(),
            indent_size: self.indent_size,
            wrap_line_length: self.wrap_line_length,
        }
    }

    /// 打印配置摘要
    pub fn print_summary(&self) {
        println!("Environment Configuration Summary:");
        println!("  Log Level: {}", self.log_level);
        println!("  Output Root: {}", self.output_root.display());
        println!(
            "  Renderer: {}",
            if self.render_enabled { "headless browser" } else { "plain fetch" }
        );
        println!(
            "  Viewport: {}x{}",
            self.viewport_width, self.viewport_height
        );
        println!("  Fetch Timeout: {}s", self.fetch_timeout.as_secs());
        if let Some(chrome_path) = &self.chrome_path {
            println!("  Chrome: {}", chrome_path.display());
        }
    }
}

/// 没有默认值的变量：未设置时为 `None`，设置了但无效时报错
fn optional<V: EnvVar<T>, T>() -> EnvResult<Option<T>> {
    match env::var(V::NAME) {
        Ok(value) => V::parse(&value).map(Some),
        Err(_) => Ok(None),
    }
}

fn doc_line(name: &str, description: &str, default: &str) -> String {
    format!("| `{}` | {} | {} |\n", name, description, default)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");
    docs.push_str("| Variable | Description | Default |\n|---|---|---|\n");

    docs.push_str(&doc_line(core::LogLevel::NAME, core::LogLevel::DESCRIPTION, "info"));
    docs.push_str(&doc_line(core::NoColor::NAME, core::NoColor::DESCRIPTION, "unset"));
    docs.push_str(&doc_line(
        fetch::UserAgent::NAME,
        fetch::UserAgent::DESCRIPTION,
        "desktop Chrome 120",
    ));
    docs.push_str(&doc_line(fetch::Timeout::NAME, fetch::Timeout::DESCRIPTION, "10"));
    docs.push_str(&doc_line(render::Enabled::NAME, render::Enabled::DESCRIPTION, "true"));
    docs.push_str(&doc_line(render::Timeout::NAME, render::Timeout::DESCRIPTION, "30"));
    docs.push_str(&doc_line(
        render::SettleDelay::NAME,
        render::SettleDelay::DESCRIPTION,
        "3000",
    ));
    docs.push_str(&doc_line(
        render::ViewportWidth::NAME,
        render::ViewportWidth::DESCRIPTION,
        "1920",
    ));
    docs.push_str(&doc_line(
        render::ViewportHeight::NAME,
        render::ViewportHeight::DESCRIPTION,
        "1080",
    ));
    docs.push_str(&doc_line(
        render::ChromePath::NAME,
        render::ChromePath::DESCRIPTION,
        "auto-detect",
    ));
    docs.push_str(&doc_line(output::Root::NAME, output::Root::DESCRIPTION, "`.`"));
    docs.push_str(&doc_line(
        output::IndentSize::NAME,
        output::IndentSize::DESCRIPTION,
        "2",
    ));
    docs.push_str(&doc_line(
        output::WrapLineLength::NAME,
        output::WrapLineLength::DESCRIPTION,
        "120",
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert_eq!(core::LogLevel::parse("warn").unwrap(), "warn");
        assert!(core::LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_boolean_parsing() {
        assert!(render::Enabled::parse("true").unwrap());
        assert!(render::Enabled::parse("1").unwrap());
        assert!(render::Enabled::parse("YES").unwrap());
        assert!(render::Enabled::parse("on").unwrap());

        assert!(!render::Enabled::parse("false").unwrap());
        assert!(!render::Enabled::parse("0").unwrap());
        assert!(!render::Enabled::parse("NO").unwrap());
        assert!(!render::Enabled::parse("off").unwrap());

        assert!(render::Enabled::parse("maybe").is_err());
    }

    #[test]
    fn test_timeout_validation() {
        assert_eq!(fetch::Timeout::parse("15").unwrap(), Duration::from_secs(15));
        assert!(fetch::Timeout::parse("0").is_err());
        assert!(fetch::Timeout::parse("301").is_err());
        assert!(render::Timeout::parse("600").is_ok());
        assert!(render::Timeout::parse("soon").is_err());
    }

    #[test]
    fn test_numeric_validation() {
        assert_eq!(output::IndentSize::parse("4").unwrap(), 4);
        assert!(output::IndentSize::parse("0").is_err());
        assert!(output::WrapLineLength::parse("20").is_err());
        assert_eq!(
            render::SettleDelay::parse("0").unwrap(),
            Duration::from_millis(0)
        );
    }

    #[test]
    fn test_error_message() {
        let error = fetch::UserAgent::parse("  ").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Environment variable 'WEBCLONE_USER_AGENT': User-Agent cannot be empty"
        );
    }

    #[test]
    fn test_env_config_loading() {
        env::set_var("WEBCLONE_RENDER_ENABLED", "off");
        env::set_var("WEBCLONE_INDENT_SIZE", "4");
        env::set_var("WEBCLONE_OUTPUT_ROOT", "/tmp/clones");

        let config = EnvConfig::from_env().unwrap();
        let options = config.to_options();
        assert!(!options.render);
        assert_eq!(options.indent_size, 4);
        assert_eq!(options.output_root, PathBuf::from("/tmp/clones"));
        assert_eq!(options.viewport, (1920, 1080));

        env::remove_var("WEBCLONE_RENDER_ENABLED");
        env::remove_var("WEBCLONE_INDENT_SIZE");
        env::remove_var("WEBCLONE_OUTPUT_ROOT");
    }

    #[test]
    fn test_generate_env_docs_lists_every_variable() {
        let docs = generate_env_docs();
        for name in [
            "WEBCLONE_LOG_LEVEL",
            "NO_COLOR",
            "WEBCLONE_USER_AGENT",
            "WEBCLONE_FETCH_TIMEOUT",
            "WEBCLONE_RENDER_ENABLED",
            "WEBCLONE_CHROME_PATH",
            "WEBCLONE_WRAP_LINE_LENGTH",
        ] {
            assert!(docs.contains(name), "missing {name}");
        }
    }
}
