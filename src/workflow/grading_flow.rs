//! 活动评分流程 - 流程层
//!
//! 核心职责：定义"一个活动"的完整评分流程
//!
//! 流程顺序：
//! 1. 构建 prompt（前 N 张图片）
//! 2. 调用评分服务（只尝试一次）
//! 3. 规整回复，生成 GradingResult
//!
//! 任何一步失败都只影响当前活动，不会返回错误

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::grading::GradingResult;
use crate::models::offer::StructuredOffer;
use crate::services::llm_service::{GradingClient, GradingRequest};
use crate::services::prompt_builder::{build_prompt, DEFAULT_MAX_IMAGES, GRADING_INSTRUCTIONS};
use crate::services::response_reconciler::{parse_failure, try_reconcile};
use crate::utils::logging::truncate_text;
use crate::workflow::offer_ctx::OfferCtx;

/// 活动处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// 评分成功
    Graded,
    /// 服务有回复但无法解析
    ParseFailed,
    /// 调用评分服务失败
    ServiceFailed,
}

/// 评分参数
#[derive(Debug, Clone)]
pub struct GradingSettings {
    /// prompt 中列出并附带的图片数量上限
    pub max_images: usize,
    pub instructions: String,
    pub verbose_logging: bool,
}

impl Default for GradingSettings {
    fn default() -> Self {
        Self {
            max_images: DEFAULT_MAX_IMAGES,
            instructions: GRADING_INSTRUCTIONS.to_string(),
            verbose_logging: false,
        }
    }
}

/// 活动评分流程
///
/// - 编排 prompt → 调用 → 规整
/// - 只依赖 GradingClient，不关心具体实现
pub struct GradingFlow<C: GradingClient + ?Sized> {
    client: Arc<C>,
    settings: GradingSettings,
}

impl<C: GradingClient + ?Sized> Clone for GradingFlow<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            settings: self.settings.clone(),
        }
    }
}

impl<C: GradingClient + ?Sized> GradingFlow<C> {
    pub fn new(client: Arc<C>, settings: GradingSettings) -> Self {
        Self { client, settings }
    }

    pub async fn run(
        &self,
        offer: &StructuredOffer,
        ctx: &OfferCtx,
    ) -> (GradingResult, ProcessResult) {
        let images = offer.prompt_images(self.settings.max_images);
        let image_urls: Vec<String> = images.iter().map(|img| img.url.clone()).collect();
        let prompt = build_prompt(offer, self.settings.max_images);

        if self.settings.verbose_logging {
            debug!("{} prompt:\n{}", ctx, prompt);
        }

        let metadata = request_metadata(offer);
        info!("{} 🤖 正在评分 ({} 张图片)...", ctx, image_urls.len());

        let reply = match self
            .client
            .grade(GradingRequest {
                instructions: &self.settings.instructions,
                prompt: &prompt,
                image_urls: &image_urls,
                metadata: &metadata,
            })
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{} ❌ 评分服务调用失败: {}", ctx, e);
                return (
                    GradingResult::service_failure(&offer.activity_id, e),
                    ProcessResult::ServiceFailed,
                );
            }
        };

        let text = reply.text();
        let (verdict, outcome) = match try_reconcile(&text, images) {
            Some(verdict) => (verdict, ProcessResult::Graded),
            None => {
                warn!(
                    "{} ⚠️ 无法解析评分结果: {}",
                    ctx,
                    truncate_text(&text, 200)
                );
                (parse_failure(&text), ProcessResult::ParseFailed)
            }
        };

        if outcome == ProcessResult::Graded {
            info!(
                "{} ✓ 分数: {} | 主图: {}",
                ctx,
                verdict
                    .score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                verdict
                    .hero_image_index
                    .map(|i| format!("#{i}"))
                    .unwrap_or_else(|| "-".to_string())
            );
        }

        (
            GradingResult::from_verdict(&offer.activity_id, verdict, reply.request_id),
            outcome,
        )
    }
}

fn request_metadata(offer: &StructuredOffer) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("activity_id".to_string(), offer.activity_id.clone());
    if let Some(category) = &offer.category {
        metadata.insert("category".to_string(), category.clone());
    }
    if let Some(city) = &offer.city {
        metadata.insert("city".to_string(), city.clone());
    }
    metadata
}
