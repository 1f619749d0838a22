//! LLM 服务 - 业务能力层
//!
//! 只负责"调用评分服务"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点、模型和推理强度
//! - 兼容 OpenAI API 的服务
//!
//! 流程层只依赖 [`GradingClient`] trait，测试时可以替换为内存实现。

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ImageDetail as VisionDetail, ImageUrl, ReasoningEffort,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;

/// 一次评分请求
#[derive(Debug, Clone, Copy)]
pub struct GradingRequest<'a> {
    /// 系统指令
    pub instructions: &'a str,
    /// 活动 prompt
    pub prompt: &'a str,
    /// 附带的图片，顺序与 prompt 中的编号一致
    pub image_urls: &'a [String],
    /// 请求元数据（活动 ID、分类等），随请求一起存档
    pub metadata: &'a BTreeMap<String, String>,
}

/// 评分服务的原始回复
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradingReply {
    /// 按顺序返回的文本片段
    pub segments: Vec<String>,
    /// 请求 ID，用于之后查日志
    pub request_id: Option<String>,
}

impl GradingReply {
    /// 所有文本片段按顺序拼接
    pub fn text(&self) -> String {
        self.segments.concat()
    }
}

/// 评分服务调用边界
#[async_trait]
pub trait GradingClient: Send + Sync {
    async fn grade(&self, request: GradingRequest<'_>) -> Result<GradingReply, LlmError>;
}

/// LLM 服务
///
/// 职责：
/// - 调用兼容 OpenAI 的 chat completion 接口
/// - 把图片作为 image_url 附件发送
/// - 只处理单个活动，不出现 Vec<StructuredOffer>
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    reasoning_effort: Option<ReasoningEffort>,
    max_output_tokens: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config, api_key: &str) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            reasoning_effort: parse_reasoning_effort(&config.llm_reasoning_effort),
            max_output_tokens: config.llm_max_output_tokens,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn build_messages(
        &self,
        request: &GradingRequest<'_>,
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        let build_err = |e: OpenAIError| LlmError::request_build_failed(&self.model_name, e);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.instructions)
            .build()
            .map_err(build_err)?;

        // 构建用户消息内容（支持图片）
        let user_msg = if request.image_urls.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt)
                .build()
                .map_err(build_err)?
        } else {
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                Vec::with_capacity(request.image_urls.len() + 1);

            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: request.prompt.to_string(),
                },
            ));

            for url in request.image_urls {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: url.clone(),
                            detail: Some(VisionDetail::Auto),
                        },
                    },
                ));
            }

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()
                .map_err(build_err)?
        };

        Ok(vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ])
    }

    /// 构建完整请求
    ///
    /// 请求会被服务端存储（`store`），返回的 ID 之后可以在日志页面查到
    fn build_request(
        &self,
        request: &GradingRequest<'_>,
    ) -> Result<CreateChatCompletionRequest, LlmError> {
        let messages = self.build_messages(request)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model_name)
            .messages(messages)
            .max_completion_tokens(self.max_output_tokens)
            .store(true);
        if let Some(effort) = self.reasoning_effort.clone() {
            args.reasoning_effort(effort);
        }
        if !request.metadata.is_empty() {
            args.metadata(metadata_value(request.metadata));
        }

        args.build()
            .map_err(|e| LlmError::request_build_failed(&self.model_name, e))
    }
}

fn metadata_value(metadata: &BTreeMap<String, String>) -> Value {
    Value::Object(
        metadata
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

#[async_trait]
impl GradingClient for LlmService {
    async fn grade(&self, request: GradingRequest<'_>) -> Result<GradingReply, LlmError> {
        debug!(
            "调用 LLM API，模型: {}，prompt 长度: {} 字符，图片: {} 张，元数据: {:?}",
            self.model_name,
            request.prompt.len(),
            request.image_urls.len(),
            request.metadata
        );

        let chat_request = self.build_request(&request)?;

        // 调用 API
        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::api_call_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功，请求 ID: {}", response.id);

        let segments = response
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .collect();

        Ok(GradingReply {
            segments,
            request_id: Some(response.id).filter(|id| !id.is_empty()),
        })
    }
}

/// 推理强度按字符串透传，无法识别时不设置
fn parse_reasoning_effort(effort: &str) -> Option<ReasoningEffort> {
    let effort = effort.trim().to_ascii_lowercase();
    if effort.is_empty() {
        return None;
    }
    match serde_json::from_value(serde_json::Value::String(effort.clone())) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("⚠️ 无法识别的推理强度 '{}'，将使用模型默认值", effort);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 创建测试用的 LlmService
    fn create_test_service() -> LlmService {
        let config = Config {
            llm_api_base_url: "http://localhost:9/v1".to_string(),
            ..Config::default()
        };
        LlmService::new(&config, "sk-test")
    }

    #[test]
    fn test_reply_text_concatenates_in_order() {
        let reply = GradingReply {
            segments: vec!["{\"score\":".to_string(), " 4}".to_string()],
            request_id: Some("req_1".to_string()),
        };
        assert_eq!(reply.text(), "{\"score\": 4}");
    }

    #[test]
    fn test_parse_reasoning_effort() {
        assert!(parse_reasoning_effort("low").is_some());
        assert!(parse_reasoning_effort(" HIGH ").is_some());
        assert!(parse_reasoning_effort("").is_none());
        assert!(parse_reasoning_effort("extreme").is_none());
    }

    #[test]
    fn test_build_messages_attaches_images() {
        let service = create_test_service();
        let metadata = BTreeMap::new();
        let urls = vec![
            "https://cdn.test/1.jpg".to_string(),
            "https://cdn.test/2.jpg".to_string(),
        ];
        let request = GradingRequest {
            instructions: "grade it",
            prompt: "Activity ID: 1",
            image_urls: &urls,
            metadata: &metadata,
        };

        let messages = service.build_messages(&request).unwrap();
        assert_eq!(messages.len(), 2);
        match &messages[1] {
            ChatCompletionRequestMessage::User(user) => match &user.content {
                ChatCompletionRequestUserMessageContent::Array(parts) => {
                    assert_eq!(parts.len(), 3);
                }
                other => panic!("unexpected content: {other:?}"),
            },
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_build_request_stores_and_forwards_metadata() {
        let service = create_test_service();
        let metadata = BTreeMap::from([
            ("activity_id".to_string(), "A1".to_string()),
            ("city".to_string(), "Lisbon".to_string()),
        ]);
        let request = GradingRequest {
            instructions: "grade it",
            prompt: "Activity ID: A1",
            image_urls: &[],
            metadata: &metadata,
        };

        let built = service.build_request(&request).unwrap();
        let body = serde_json::to_value(&built).unwrap();
        assert_eq!(body["store"], Value::Bool(true));
        assert_eq!(body["metadata"]["activity_id"], "A1");
        assert_eq!(body["metadata"]["city"], "Lisbon");
        assert_eq!(body["model"], "gpt-5-mini");
        assert_eq!(body["max_completion_tokens"], 4096);
        assert_eq!(body["reasoning_effort"], "low");
    }

    #[test]
    fn test_build_request_without_metadata() {
        let service = create_test_service();
        let metadata = BTreeMap::new();
        let request = GradingRequest {
            instructions: "grade it",
            prompt: "Activity ID: 2",
            image_urls: &[],
            metadata: &metadata,
        };

        let body = serde_json::to_value(service.build_request(&request).unwrap()).unwrap();
        assert_eq!(body["store"], Value::Bool(true));
        assert!(body.get("metadata").is_none());
    }

    /// 测试真实 API 调用
    ///
    /// 运行方式：
    /// ```bash
    /// OPENAI_API_KEY=... cargo test test_live_grading -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_live_grading() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let api_key = config.resolve_api_key().expect("需要 OPENAI_API_KEY");
        let service = LlmService::new(&config, &api_key);
        let metadata = BTreeMap::from([("activity_id".to_string(), "live-test".to_string())]);

        let reply = service
            .grade(GradingRequest {
                instructions: crate::services::prompt_builder::GRADING_INSTRUCTIONS,
                prompt: "Activity ID: live-test\nTitle: Walking tour of the old town\n",
                image_urls: &[],
                metadata: &metadata,
            })
            .await
            .expect("调用失败");

        println!("请求 ID: {:?}", reply.request_id);
        println!("{}", reply.text());
        assert!(!reply.text().is_empty());
    }
}
