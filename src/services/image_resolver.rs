//! 图片解析
//!
//! 活动的图片可能出现在两层：顶层条目自身的 `url`，以及条目下嵌套的
//! `images` 列表。这里把两层展开、标记来源，并按 URL 去重（保留首次出现）。

use serde_json::Value;
use std::collections::HashSet;

use crate::models::offer::{ImageDetail, ImageSource};
use crate::services::record_structurer::{str_field, u64_field};

/// 展开并去重图片
pub fn resolve_images(images: Option<&Value>) -> Vec<ImageDetail> {
    let Some(entries) = images.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for entry in entries {
        if let Some(detail) = image_detail(entry, ImageSource::Primary) {
            candidates.push(detail);
        }

        if let Some(nested) = entry.get("images").and_then(Value::as_array) {
            candidates.extend(
                nested
                    .iter()
                    .filter_map(|item| image_detail(item, ImageSource::Nested)),
            );
        }
    }

    let mut seen = HashSet::new();
    candidates.retain(|detail| seen.insert(detail.url.clone()));
    candidates
}

/// 没有可用 URL 的条目返回 None
fn image_detail(entry: &Value, source: ImageSource) -> Option<ImageDetail> {
    let url = str_field(entry, "url")?;

    Some(ImageDetail {
        url,
        image_type: str_field(entry, "type"),
        alt: str_field(entry, "alt"),
        description: str_field(entry, "description"),
        width: u64_field(entry, "width"),
        height: u64_field(entry, "height"),
        source,
    })
}
