//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<StructuredOffer>，管理 worker 和共享队列)
//!     ↓
//! workflow::GradingFlow (处理单个活动)
//!     ↓
//! services (能力层：prompt / llm / reconcile / csv)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → workflow → services
//! 2. **无业务逻辑**：只做调度、排序和统计，不做具体评分判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, BatchOutcome, BatchState, GradingBatch, ProcessingStats};
