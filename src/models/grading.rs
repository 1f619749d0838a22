
/// 评分服务返回内容规整后的结果（不含活动 ID 和请求 ID）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    pub score: Option<f64>,
    pub reason: String,
    pub categories: Vec<String>,
    pub target_audiences: Vec<String>,
    /// 从 1 开始，对应 prompt 中的图片编号
    pub hero_image_index: Option<usize>,
    pub hero_image_url: Option<String>,
    pub hero_image_reason: String,
}

/// 单个活动的评分结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradingResult {
    pub activity_id: String,
    pub score: Option<f64>,
    pub reason: String,
    pub categories: Vec<String>,
    pub target_audiences: Vec<String>,
    pub hero_image_index: Option<usize>,
    pub hero_image_url: Option<String>,
    pub hero_image_reason: String,
    /// 评分服务的请求 ID，调用失败时为空
    pub request_id: Option<String>,
}

impl GradingResult {
    pub fn from_verdict(
        activity_id: impl Into<String>,
        verdict: Verdict,
        request_id: Option<String>,
    ) -> Self {
        Self {
            activity_id: activity_id.into(),
            score: verdict.score,
            reason: verdict.reason,
            categories: verdict.categories,
            target_audiences: verdict.target_audiences,
            hero_image_index: verdict.hero_image_index,
            hero_image_url: verdict.hero_image_url,
            hero_image_reason: verdict.hero_image_reason,
            request_id,
        }
    }

    /// 调用评分服务失败时的结果
    pub fn service_failure(activity_id: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            activity_id: activity_id.into(),
            reason: format!("Grading request failed: {error}"),
            ..Default::default()
        }
    }
}

/// 最终排序：先按活动 ID，再按 reason
pub fn sort_results(results: &mut [GradingResult]) {
    results.sort_by(|a, b| {
        a.activity_id
            .cmp(&b.activity_id)
            .then_with(|| a.reason.cmp(&b.reason))
    });
}
