use serde_json::Value;

/// 图片来源：活动图片列表的顶层，或者嵌套在某个图片条目里
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Primary,
    Nested,
}

/// 单张图片的详细信息
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDetail {
    pub url: String,
    pub image_type: Option<String>,
    pub alt: Option<String>,
    pub description: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub source: ImageSource,
}

impl ImageDetail {
    pub fn new(url: impl Into<String>, source: ImageSource) -> Self {
        Self {
            url: url.into(),
            image_type: None,
            alt: None,
            description: None,
            width: None,
            height: None,
            source,
        }
    }
}

/// 套餐摘要
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageSummary {
    pub id: Option<String>,
    pub name: Option<String>,
    /// 套餐 sections 渲染后的文本
    pub details: String,
}

/// 规整后的活动
///
/// 由原始记录构建一次，之后只读。`images` 与 `image_details` 是同一组
/// 去重后的 URL，顺序一致。
#[derive(Debug, Clone, Default)]
pub struct StructuredOffer {
    pub activity_id: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub highlight: Option<String>,
    /// 原样透传，结构不固定
    pub location: Option<Value>,
    pub address: Option<Value>,
    pub category: Option<String>,
    pub category_metadata: Option<Value>,
    pub description: String,
    pub packages: Vec<PackageSummary>,
    pub images: Vec<String>,
    pub image_details: Vec<ImageDetail>,
    pub city: Option<String>,
    pub country: Option<String>,
    /// 只用于过滤
    pub status: Option<String>,
    /// 原始 activity 对象
    pub raw: Value,
}

impl StructuredOffer {
    /// 状态是否为已审核（不区分大小写）
    pub fn is_curated(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(CURATED_STATUS))
    }

    /// 发送给评分服务的图片（前 `max_images` 张）
    pub fn prompt_images(&self, max_images: usize) -> &[ImageDetail] {
        let end = self.image_details.len().min(max_images);
        &self.image_details[..end]
    }
}

/// 已审核状态标记，带此状态的活动不再评分
pub const CURATED_STATUS: &str = "curated";
