//! 环境变量系统演示
//!
//! 展示如何用类型安全的环境变量配置克隆任务

use std::env;

use webclone::env::{EnvConfig, EnvVar};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== WebClone 环境变量系统演示 ===\n");

    // 设置一些示例环境变量
    env::set_var("WEBCLONE_RENDER_ENABLED", "false");
    env::set_var("WEBCLONE_FETCH_TIMEOUT", "20");
    env::set_var("WEBCLONE_VIEWPORT_WIDTH", "1280");
    env::set_var("WEBCLONE_OUTPUT_ROOT", "clones");

    // 1. 单独获取环境变量
    println!("1. 单独获取环境变量:");
    println!("   渲染启用: {}", webclone::env::render::Enabled::get()?);
    println!("   下载超时: {:?}", webclone::env::fetch::Timeout::get()?);
    println!("   视口宽度: {}", webclone::env::render::ViewportWidth::get()?);

    // 2. 批量加载配置
    println!("\n2. 完整环境配置:");
    let config = EnvConfig::from_env()?;
    config.print_summary();

    let options = config.to_options();
    println!("   -> 输出目录: {}", options.output_root.display());

    // 3. 类型安全验证
    println!("\n3. 类型安全验证:");

    env::set_var("WEBCLONE_FETCH_TIMEOUT", "invalid");
    match webclone::env::fetch::Timeout::get() {
        Ok(timeout) => println!("   超时: {:?}", timeout),
        Err(e) => println!("   超时解析错误: {}", e),
    }

    env::set_var("WEBCLONE_WRAP_LINE_LENGTH", "5000");
    match webclone::env::output::WrapLineLength::get() {
        Ok(length) => println!("   折行宽度: {}", length),
        Err(e) => println!("   折行宽度验证失败: {}", e),
    }

    // 4. 默认值演示
    println!("\n4. 默认值演示:");
    env::remove_var("WEBCLONE_LOG_LEVEL");
    println!("   日志级别 (默认): {}", webclone::env::core::LogLevel::get()?);

    // 清理示例环境变量
    env::remove_var("WEBCLONE_RENDER_ENABLED");
    env::remove_var("WEBCLONE_FETCH_TIMEOUT");
    env::remove_var("WEBCLONE_VIEWPORT_WIDTH");
    env::remove_var("WEBCLONE_OUTPUT_ROOT");
    env::remove_var("WEBCLONE_WRAP_LINE_LENGTH");

    println!("\n=== 演示完成 ===");
    Ok(())
}
