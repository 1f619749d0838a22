//! # Offer Grader
//!
//! 一个用于批量评估旅游活动质量并挑选主图的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - `StructuredOffer`、`GradingResult` 以及 JSON 文件加载
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个活动
//! - `record_structurer` / `image_resolver` / `description` - 原始记录规整
//! - `prompt_builder` - 构建评分 prompt
//! - `LlmService` - 调用评分服务（`GradingClient` trait）
//! - `response_reconciler` - 规整评分回复，校验主图编号与 URL
//! - `CsvWriter` - 导出 CSV
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个活动"的完整评分流程
//! - `OfferCtx` - 上下文封装（活动 ID + 序号）
//! - `GradingFlow` - 流程编排（prompt → LLM → reconcile）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量评分，管理 worker、共享队列和最终排序

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{GradingResult, ImageDetail, StructuredOffer};
pub use orchestrator::{App, BatchOutcome, GradingBatch};
pub use services::{GradingClient, GradingReply, GradingRequest, LlmService};
pub use workflow::{GradingFlow, GradingSettings, OfferCtx};
