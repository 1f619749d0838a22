//! Prompt 构建
//!
//! 把 StructuredOffer 渲染为发送给评分服务的文本。图片列表的编号与实际
//! 附带的图片是同一段切片（前 `max_images` 张），顺序一致。

use serde_json::Value;

use crate::models::offer::{ImageDetail, StructuredOffer};

/// 图片描述最多保留的字符数
pub const IMAGE_DESCRIPTION_LIMIT: usize = 120;

/// 默认最多附带的图片数
pub const DEFAULT_MAX_IMAGES: usize = 8;

/// 系统指令
pub const GRADING_INSTRUCTIONS: &str = "You are a content quality reviewer for a travel experiences marketplace. \
Grade the activity offer described by the user on a scale from 0 (unusable) to 5 (excellent), \
considering the clarity and completeness of the description, the packages on offer and the quality of the images. \
Choose the single best hero image from the numbered image list; the attached images are in the same order as the list. \
Respond with a single JSON object and nothing else, using these keys: \
\"score\" (number 0-5), \"reason\" (string), \"categories\" (array of strings), \
\"target_audiences\" (array of strings), \"hero_image_index\" (1-based integer from the image list, or null), \
\"hero_image_url\" (the exact URL of that image, or null), \"hero_image_reason\" (string).";

/// 构建评分 prompt
pub fn build_prompt(offer: &StructuredOffer, max_images: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!("Activity ID: {}\n", offer.activity_id));
    push_line(&mut out, "Title", offer.title.as_deref());
    push_line(&mut out, "Subtitle", offer.subtitle.as_deref());
    push_line(&mut out, "Highlight", offer.highlight.as_deref());
    push_line(&mut out, "Category", offer.category.as_deref());
    push_line(&mut out, "City", offer.city.as_deref());
    push_line(&mut out, "Country", offer.country.as_deref());
    push_line(&mut out, "Location", offer.location.as_ref().map(render_opaque).as_deref());
    push_line(&mut out, "Address", offer.address.as_ref().map(render_opaque).as_deref());

    out.push_str("\nDescription:\n");
    if offer.description.is_empty() {
        out.push_str("No description provided.\n");
    } else {
        out.push_str(&offer.description);
        out.push('\n');
    }

    out.push_str("\nPackages:\n");
    if offer.packages.is_empty() {
        out.push_str("No packages listed.\n");
    } else {
        let blocks: Vec<String> = offer
            .packages
            .iter()
            .enumerate()
            .map(|(i, package)| {
                let name = package
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Package {}", i + 1));
                let body = if package.details.is_empty() {
                    "No package details provided."
                } else {
                    package.details.as_str()
                };
                format!("Package: {name}\n{body}")
            })
            .collect();
        out.push_str(&blocks.join("\n\n"));
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&render_image_list(offer.prompt_images(max_images)));

    out
}

/// 编号图片列表
pub fn render_image_list(images: &[ImageDetail]) -> String {
    if images.is_empty() {
        return "No images available.\n".to_string();
    }

    let mut out = format!(
        "Images (numbered 1-{}; use these numbers for hero_image_index):\n",
        images.len()
    );
    for (i, image) in images.iter().enumerate() {
        out.push_str(&format!(
            "{}. type: {} | alt: {} | description: {} | url: {}\n",
            i + 1,
            image.image_type.as_deref().unwrap_or("UNKNOWN"),
            image.alt.as_deref().unwrap_or("N/A"),
            image
                .description
                .as_deref()
                .map(|d| truncate_description(d, IMAGE_DESCRIPTION_LIMIT))
                .unwrap_or_else(|| "N/A".to_string()),
            image.url
        ));
    }
    out
}

/// 超过上限时截断并加 `...`
fn truncate_description(text: &str, max_chars: usize) -> String {
    if text.is_empty() {
        return "N/A".to_string();
    }
    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

fn push_line(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        out.push_str(&format!("{label}: {value}\n"));
    }
}

/// 透传字段：字符串原样输出，其余序列化为 JSON
fn render_opaque(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::offer::{ImageSource, PackageSummary};

    fn image(n: usize) -> ImageDetail {
        ImageDetail::new(format!("https://cdn.test/{n}.jpg"), ImageSource::Primary)
    }

    fn offer_with_images(count: usize) -> StructuredOffer {
        StructuredOffer {
            activity_id: "A1".to_string(),
            title: Some("Food tour".to_string()),
            image_details: (1..=count).map(image).collect(),
            images: (1..=count).map(|n| format!("https://cdn.test/{n}.jpg")).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_image_list_is_capped() {
        let prompt = build_prompt(&offer_with_images(10), DEFAULT_MAX_IMAGES);
        assert!(prompt.contains("8. type: UNKNOWN | alt: N/A | description: N/A | url: https://cdn.test/8.jpg"));
        assert!(!prompt.contains("https://cdn.test/9.jpg"));
        assert!(!prompt.contains("\n9. "));
    }

    #[test]
    fn test_no_images() {
        let prompt = build_prompt(&offer_with_images(0), DEFAULT_MAX_IMAGES);
        assert!(prompt.contains("No images available."));
        assert!(!prompt.contains("Images (numbered"));
    }

    #[test]
    fn test_image_metadata_and_truncation() {
        let long = "x".repeat(130);
        let mut detail = image(1);
        detail.image_type = Some("cover".to_string());
        detail.alt = Some("Market stall".to_string());
        detail.description = Some(long);

        let list = render_image_list(&[detail]);
        let expected = format!(
            "1. type: cover | alt: Market stall | description: {}... | url: https://cdn.test/1.jpg\n",
            "x".repeat(120)
        );
        assert!(list.ends_with(&expected), "got: {list}");
    }

    #[test]
    fn test_description_at_limit_not_truncated() {
        let exact = "é".repeat(120);
        assert_eq!(truncate_description(&exact, 120), exact);
    }

    #[test]
    fn test_package_defaults() {
        let offer = StructuredOffer {
            activity_id: "A2".to_string(),
            packages: vec![
                PackageSummary {
                    id: Some("p1".to_string()),
                    name: Some("Private tour".to_string()),
                    details: "## Includes\nGuide".to_string(),
                },
                PackageSummary::default(),
            ],
            ..Default::default()
        };

        let prompt = build_prompt(&offer, DEFAULT_MAX_IMAGES);
        assert!(prompt.contains("Package: Private tour\n## Includes\nGuide\n\nPackage: Package 2\nNo package details provided.\n"));
    }

    #[test]
    fn test_identifying_fields() {
        let mut offer = offer_with_images(1);
        offer.location = Some(serde_json::json!({"lat": 1.5}));
        offer.description = "## Overview\nTasting".to_string();

        let prompt = build_prompt(&offer, DEFAULT_MAX_IMAGES);
        assert!(prompt.starts_with("Activity ID: A1\nTitle: Food tour\n"));
        assert!(prompt.contains("Location: {\"lat\":1.5}\n"));
        assert!(prompt.contains("Description:\n## Overview\nTasting\n"));
        assert!(!prompt.contains("Subtitle:"));
    }
}
