//! CSV 导出服务 - 业务能力层
//!
//! 只负责"把排好序的评分结果写成 CSV"能力，不关心流程

use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::grading::GradingResult;

pub const CSV_HEADER: [&str; 10] = [
    "activity_id",
    "activity_url",
    "hero_image_index",
    "hero_image_url",
    "hero_image_reason",
    "categories",
    "target_audiences",
    "score",
    "reason",
    "log_url",
];

const LIST_SEPARATOR: &str = "; ";

/// CSV 导出服务
///
/// 职责：
/// - 根据模板生成活动链接和日志链接
/// - 按固定列顺序输出
/// - 每次运行覆盖旧文件
pub struct CsvWriter {
    output_path: String,
    activity_url_template: String,
    log_url_template: String,
}

impl CsvWriter {
    pub fn new(
        output_path: impl Into<String>,
        activity_url_template: impl Into<String>,
        log_url_template: impl Into<String>,
    ) -> Self {
        Self {
            output_path: output_path.into(),
            activity_url_template: activity_url_template.into(),
            log_url_template: log_url_template.into(),
        }
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    /// 写入文件（会创建上级目录）
    pub async fn write(&self, results: &[GradingResult]) -> AppResult<()> {
        let content = self.render(results);
        let path = Path::new(&self.output_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }

        fs::write(path, content)
            .await
            .map_err(|e| AppError::file_write_failed(&self.output_path, e))?;

        debug!("已写入 {} 行到 {}", results.len(), self.output_path);
        Ok(())
    }

    /// 生成 CSV 文本
    pub fn render(&self, results: &[GradingResult]) -> String {
        let mut out = CSV_HEADER.join(",");
        out.push('\n');

        for result in results {
            let row = [
                result.activity_id.clone(),
                fill_template(&self.activity_url_template, "{id}", Some(&result.activity_id)),
                result
                    .hero_image_index
                    .map(|i| i.to_string())
                    .unwrap_or_default(),
                result.hero_image_url.clone().unwrap_or_default(),
                result.hero_image_reason.clone(),
                result.categories.join(LIST_SEPARATOR),
                result.target_audiences.join(LIST_SEPARATOR),
                result.score.map(|s| s.to_string()).unwrap_or_default(),
                result.reason.clone(),
                fill_template(
                    &self.log_url_template,
                    "{request_id}",
                    result.request_id.as_deref(),
                ),
            ];

            let escaped: Vec<String> = row.iter().map(|field| escape_field(field)).collect();
            out.push_str(&escaped.join(","));
            out.push('\n');
        }

        out
    }
}

/// 值为空时返回空字符串
fn fill_template(template: &str, placeholder: &str, value: Option<&str>) -> String {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => template.replace(placeholder, v),
        None => String::new(),
    }
}

/// 包含逗号、双引号或换行时加引号，内部双引号加倍
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
