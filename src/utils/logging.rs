//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则 verbose 时为 debug，默认 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `workers`: 并发 worker 数
/// - `model`: 评分模型
pub fn log_startup(workers: usize, model: &str) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - 活动评分 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📊 并发 worker 数: {}", workers);
    info!("🤖 评分模型: {}", model);
    info!("{}", "=".repeat(60));
}

/// 记录活动加载信息
///
/// # 参数
/// - `loaded`: 成功加载的活动数
/// - `eligible`: 待评分的活动数
/// - `excluded`: 已审核而跳过的活动数
pub fn log_offers_loaded(loaded: usize, eligible: usize, excluded: usize) {
    info!("✓ 加载了 {} 个活动", loaded);
    info!("📋 待评分: {}，已审核跳过: {}", eligible, excluded);
}

/// 打印最终统计信息
pub fn print_final_stats(
    graded: usize,
    parse_failed: usize,
    service_failed: usize,
    excluded: usize,
    output_path: &str,
) {
    let total = graded + parse_failed + service_failed;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", graded, total);
    info!("⚠️ 无法解析: {}", parse_failed);
    info!("❌ 调用失败: {}", service_failed);
    info!("⏭️ 已审核跳过: {}", excluded);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
