//! 描述渲染
//!
//! 把 section → group → content 的树压平为 markdown 风格的文本，
//! 活动描述和套餐详情共用同一套规则。

use serde_json::Value;

use crate::services::record_structurer::str_field;

/// 渲染 section 列表
///
/// - 内容为空的 group 丢弃；有名字的 group 前加 `### 名字`
/// - 同一 section 内的 group 以空行连接，结果为空的 section 丢弃
/// - 有名字的 section 前加 `## 名字`，section 之间以空行连接
///
/// 输入缺失或不是数组时返回空字符串
pub fn render_sections(sections: Option<&Value>) -> String {
    let Some(sections) = sections.and_then(Value::as_array) else {
        return String::new();
    };

    sections
        .iter()
        .filter_map(render_section)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_section(section: &Value) -> Option<String> {
    let body = section
        .get("groups")
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .filter_map(render_group)
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .unwrap_or_default();

    if body.is_empty() {
        return None;
    }

    Some(match str_field(section, "name") {
        Some(name) => format!("## {name}\n{body}"),
        None => body,
    })
}

/// 内容原样输出，只有空字符串视为空
fn render_group(group: &Value) -> Option<String> {
    let content = group
        .get("content")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())?;

    Some(match str_field(group, "name") {
        Some(name) => format!("### {name}\n{content}"),
        None => content.to_string(),
    })
}
