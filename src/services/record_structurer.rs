//! 记录规整 - 业务能力层
//!
//! 把结构不固定的原始 activity 记录转换为 [`StructuredOffer`]。
//! 原始 JSON 只在这里通过下面几个可选字段访问函数读取，字段类型不对时
//! 一律当作缺失处理，不会让整条记录失败。

use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::models::offer::{PackageSummary, StructuredOffer};
use crate::services::description::render_sections;
use crate::services::image_resolver::resolve_images;

/// 把原始 activity 对象规整为 StructuredOffer
///
/// `source` 只用于日志
pub fn structure_offer(activity: &Value, source: &Path) -> StructuredOffer {
    let activity_id = id_field(activity, "id").unwrap_or_else(|| {
        warn!("⚠️ 记录缺少 id: {}", source.display());
        String::new()
    });

    let category_metadata = object_field(activity, "category_metadata").cloned();
    let category = category_metadata
        .as_ref()
        .and_then(|meta| object_field(meta, "sub_category"))
        .and_then(|sub| str_field(sub, "name"));

    let status = str_field(activity, "status")
        .or_else(|| str_field(activity, "curation_status"))
        .or_else(|| {
            category_metadata
                .as_ref()
                .and_then(|meta| str_field(meta, "curation_status"))
        });

    let (city, country) = first_city(activity);

    let image_details = resolve_images(activity.get("images"));
    let images = image_details.iter().map(|d| d.url.clone()).collect();

    StructuredOffer {
        activity_id,
        title: str_field(activity, "title"),
        subtitle: str_field(activity, "subtitle"),
        highlight: str_field(activity, "highlight"),
        location: present(activity, "location"),
        address: present(activity, "address"),
        category,
        category_metadata,
        description: render_sections(activity.get("sections")),
        packages: structure_packages(activity.get("packages")),
        images,
        image_details,
        city,
        country,
        status,
        raw: activity.clone(),
    }
}

/// 套餐列表：只保留对象形式的条目
fn structure_packages(packages: Option<&Value>) -> Vec<PackageSummary> {
    let Some(entries) = packages.and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| PackageSummary {
            id: id_field(entry, "id"),
            name: str_field(entry, "name"),
            details: render_sections(entry.get("sections")),
        })
        .collect()
}

/// 城市和国家取自 `cities` 的第一个条目
fn first_city(activity: &Value) -> (Option<String>, Option<String>) {
    let Some(first) = activity
        .get("cities")
        .and_then(Value::as_array)
        .and_then(|cities| cities.first())
    else {
        return (None, None);
    };

    let city = str_field(first, "name");
    let country = str_field(first, "country").or_else(|| {
        object_field(first, "country").and_then(|country| str_field(country, "name"))
    });
    (city, country)
}

// ========== 原始字段访问 ==========

/// 非空字符串字段（去掉首尾空白）
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 标识符字段：字符串或数字都接受
pub(crate) fn id_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn object_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| v.is_object())
}

/// 非负整数字段，接受数字或数字字符串
pub(crate) fn u64_field(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 透传字段，null 视为缺失
fn present(value: &Value, key: &str) -> Option<Value> {
    value.get(key).filter(|v| !v.is_null()).cloned()
}
