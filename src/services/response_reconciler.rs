//! 评分结果规整
//!
//! 评分服务返回的 JSON 字段类型并不可靠，这里负责解析、修正取值范围，
//! 并让主图编号与主图 URL 互相校验。

use serde_json::{Map, Value};

use crate::models::grading::Verdict;
use crate::models::offer::ImageDetail;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 5.0;

/// 服务内部的附件引用，不是可访问的图片地址
const ATTACHMENT_SCHEMES: &[&str] = &["attachment:", "sediment:", "file-service:"];

/// 解析并规整评分回复
///
/// `images` 必须是 prompt 中编号使用的同一组图片
pub fn reconcile(raw_text: &str, images: &[ImageDetail]) -> Verdict {
    try_reconcile(raw_text, images).unwrap_or_else(|| parse_failure(raw_text))
}

/// 无法解析出 JSON 对象时的结果：没有分数，reason 附带原文
pub fn parse_failure(raw_text: &str) -> Verdict {
    Verdict {
        reason: format!("Failed to parse grading response: {raw_text}"),
        ..Default::default()
    }
}

/// 回复中找不到 JSON 对象时返回 None
pub fn try_reconcile(raw_text: &str, images: &[ImageDetail]) -> Option<Verdict> {
    let parsed = parse_reply(raw_text)?;

    let (hero_image_index, hero_image_url) = reconcile_hero_image(
        parsed.get("hero_image_index"),
        parsed.get("hero_image_url"),
        images,
    );

    Some(Verdict {
        score: parsed.get("score").and_then(coerce_score),
        reason: match parsed.get("reason") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(parsed.clone()).to_string(),
        },
        categories: string_list(parsed.get("categories")),
        target_audiences: string_list(parsed.get("target_audiences")),
        hero_image_index,
        hero_image_url,
        hero_image_reason: match parsed.get("hero_image_reason") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
    })
}

/// 先整体解析，失败时取第一个 `{` 到最后一个 `}` 之间的内容
fn parse_reply(text: &str) -> Option<Map<String, Value>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Some(map);
    }

    match serde_json::from_str::<Value>(extract_json_object(text)?) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end >= start).then_some(&raw[start..=end])
}

/// 分数：数字或数字字符串，限制在 [0, 5]
fn coerce_score(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    score
        .is_finite()
        .then(|| score.clamp(MIN_SCORE, MAX_SCORE))
}

/// 列表逐项转字符串，去掉 null 和空字符串；单个值包装为列表
///
/// 字符串原样保留，不去除空白
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(stringify).collect(),
        Some(scalar) => stringify(scalar).into_iter().collect(),
    }
}

fn stringify(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// 编号：整数、整数值的浮点数或数字字符串
fn coerce_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn is_attachment_reference(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ATTACHMENT_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// 主图编号与 URL 互相校验
///
/// 1. 编号转换失败视为没有编号
/// 2. 编号在 `[1, len]` 内时，用该位置的 URL 覆盖返回的 URL；超出范围则丢弃编号
/// 3. URL 去掉首尾空白，空字符串视为没有
/// 4. 附件引用形式的 URL 丢弃
/// 5. 没有 URL 但编号有效时，用编号对应的 URL
/// 6. 有 URL 但没有编号时，在图片列表中查找并补上编号
fn reconcile_hero_image(
    raw_index: Option<&Value>,
    raw_url: Option<&Value>,
    images: &[ImageDetail],
) -> (Option<usize>, Option<String>) {
    let index = raw_index
        .and_then(coerce_index)
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| (1..=images.len()).contains(i));

    let url = match index {
        Some(i) => Some(images[i - 1].url.as_str()),
        None => raw_url.and_then(Value::as_str),
    }
    .map(str::trim)
    .filter(|u| !u.is_empty() && !is_attachment_reference(u))
    .map(str::to_string);

    match (index, url) {
        (Some(i), None) => (Some(i), Some(images[i - 1].url.clone())),
        (None, Some(u)) => {
            let found = images.iter().position(|img| img.url == u).map(|p| p + 1);
            (found, Some(u))
        }
        other => other,
    }
}
