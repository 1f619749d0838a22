use crate::error::{AppError, AppResult, FileError};
use crate::models::offer::StructuredOffer;
use crate::services::record_structurer::structure_offer;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 JSON 文件加载数据并转换为 StructuredOffer
///
/// 文件必须能解析为 JSON，且包含顶层 `activity` 对象
pub async fn load_json_to_offer(json_file_path: &Path) -> AppResult<StructuredOffer> {
    let display = json_file_path.display().to_string();

    let content = fs::read_to_string(json_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&display, e))?;

    parse_offer(&content, json_file_path)
}

/// 解析单个文件内容
pub fn parse_offer(content: &str, source: &Path) -> AppResult<StructuredOffer> {
    let path = source.display().to_string();

    let document: Value = serde_json::from_str(content).map_err(|e| FileError::JsonParseFailed {
        path: path.clone(),
        source: e,
    })?;

    let activity = document
        .get("activity")
        .filter(|a| a.is_object())
        .ok_or(FileError::MissingActivity { path })?;

    Ok(structure_offer(activity, source))
}

/// 从文件夹中加载所有 JSON 文件
///
/// 按文件名排序；单个文件失败只记录警告并跳过
pub async fn load_all_json_files(folder_path: &str) -> AppResult<Vec<StructuredOffer>> {
    let folder = PathBuf::from(folder_path);

    if !folder.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    let mut json_files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            json_files.push(path);
        }
    }
    json_files.sort();

    let mut offers = Vec::with_capacity(json_files.len());
    for path in json_files {
        match load_json_to_offer(&path).await {
            Ok(offer) => {
                tracing::debug!(
                    "已加载 {} (活动 {}, {} 张图片, {} 个套餐)",
                    path.file_name().unwrap_or_default().to_string_lossy(),
                    offer.activity_id,
                    offer.images.len(),
                    offer.packages.len()
                );
                offers.push(offer);
            }
            Err(e) => {
                tracing::warn!("⚠️ 跳过文件 {}: {}", path.display(), e);
            }
        }
    }

    Ok(offers)
}
