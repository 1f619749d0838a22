//! 批量评分处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量活动的评分和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：解析凭证、创建 LlmService 和 CsvWriter
//! 2. **批量加载**：扫描并加载所有活动（`Vec<StructuredOffer>`）
//! 3. **过滤**：已审核（curated）的活动不评分也不导出
//! 4. **并发控制**：固定数量的 worker 从共享队列中逐个取活动
//! 5. **确定顺序**：全部完成后按活动 ID、reason 排序，与完成先后无关
//! 6. **全局统计**：汇总成功、解析失败、调用失败的数量
//!
//! ## 状态
//!
//! `Idle → Running → Done`，每个 GradingBatch 只运行一次

use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::grading::{sort_results, GradingResult};
use crate::models::offer::StructuredOffer;
use crate::services::csv_writer::CsvWriter;
use crate::services::llm_service::{GradingClient, LlmService};
use crate::services::prompt_builder::GRADING_INSTRUCTIONS;
use crate::utils::logging::{log_offers_loaded, log_startup, print_final_stats};
use crate::workflow::grading_flow::{GradingFlow, GradingSettings, ProcessResult};
use crate::workflow::offer_ctx::OfferCtx;

/// 批次状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Done,
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub graded: usize,
    pub parse_failed: usize,
    pub service_failed: usize,
    /// 已审核而跳过的活动
    pub excluded: usize,
}

impl ProcessingStats {
    fn record(&mut self, outcome: ProcessResult) {
        match outcome {
            ProcessResult::Graded => self.graded += 1,
            ProcessResult::ParseFailed => self.parse_failed += 1,
            ProcessResult::ServiceFailed => self.service_failed += 1,
        }
    }
}

/// 批次结果：已排序的评分结果和统计
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<GradingResult>,
    pub stats: ProcessingStats,
}

type OfferQueue = Arc<Mutex<VecDeque<(usize, StructuredOffer)>>>;
type ResultSink = Arc<Mutex<Vec<(GradingResult, ProcessResult)>>>;

/// 一次批量评分
pub struct GradingBatch<C: GradingClient + ?Sized + 'static> {
    flow: GradingFlow<C>,
    concurrency: usize,
    state: BatchState,
}

impl<C: GradingClient + ?Sized + 'static> GradingBatch<C> {
    /// `concurrency` 小于 1 时按 1 处理
    pub fn new(client: Arc<C>, settings: GradingSettings, concurrency: usize) -> Self {
        Self {
            flow: GradingFlow::new(client, settings),
            concurrency: concurrency.max(1),
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// 评分所有未审核的活动
    pub async fn run(&mut self, offers: Vec<StructuredOffer>) -> BatchOutcome {
        self.state = BatchState::Running;

        let loaded = offers.len();
        let (curated, eligible): (Vec<_>, Vec<_>) =
            offers.into_iter().partition(StructuredOffer::is_curated);

        let mut stats = ProcessingStats {
            excluded: curated.len(),
            ..Default::default()
        };
        log_offers_loaded(loaded, eligible.len(), stats.excluded);

        if eligible.is_empty() {
            warn!("⚠️ 没有待评分的活动");
            self.state = BatchState::Done;
            return BatchOutcome {
                results: Vec::new(),
                stats,
            };
        }

        let total = eligible.len();
        let queue: OfferQueue = Arc::new(Mutex::new(
            eligible
                .into_iter()
                .enumerate()
                .map(|(i, offer)| (i + 1, offer))
                .collect(),
        ));
        let sink: ResultSink = Arc::new(Mutex::new(Vec::with_capacity(total)));

        let workers = self.concurrency.min(total);
        info!("📦 启动 {} 个 worker，共 {} 个活动", workers, total);

        let handles: Vec<_> = (1..=workers)
            .map(|worker_id| {
                let flow = self.flow.clone();
                let queue = Arc::clone(&queue);
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    run_worker(worker_id, flow, queue, sink, total).await;
                })
            })
            .collect();

        for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = joined {
                error!("[worker {}] 任务执行失败: {}", worker_id + 1, e);
            }
        }

        let collected = std::mem::take(&mut *sink.lock().await);
        let mut results = Vec::with_capacity(collected.len());
        for (result, outcome) in collected {
            stats.record(outcome);
            results.push(result);
        }
        sort_results(&mut results);

        self.state = BatchState::Done;
        BatchOutcome { results, stats }
    }
}

/// 单个 worker：每次从队列取一个活动，直到队列为空
async fn run_worker<C: GradingClient + ?Sized>(
    worker_id: usize,
    flow: GradingFlow<C>,
    queue: OfferQueue,
    sink: ResultSink,
    total: usize,
) {
    loop {
        let next = queue.lock().await.pop_front();
        let Some((offer_index, offer)) = next else {
            break;
        };

        let ctx = OfferCtx::new(offer.activity_id.clone(), offer_index, total);
        let graded = flow.run(&offer, &ctx).await;
        sink.lock().await.push(graded);
    }
    tracing::debug!("[worker {}] 队列已空，退出", worker_id);
}

/// 应用主结构
pub struct App {
    config: Config,
    llm_service: Arc<LlmService>,
    csv_writer: CsvWriter,
}

impl App {
    /// 初始化应用
    ///
    /// 找不到凭证时直接返回错误
    pub fn initialize(config: Config) -> AppResult<Self> {
        log_startup(config.grading_concurrency, &config.llm_model_name);

        let api_key = config.resolve_api_key()?;
        let llm_service = Arc::new(LlmService::new(&config, &api_key));
        let csv_writer = CsvWriter::new(
            &config.output_csv,
            &config.activity_url_template,
            &config.log_url_template,
        );

        Ok(Self {
            config,
            llm_service,
            csv_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<BatchOutcome> {
        info!("\n📁 正在扫描活动目录: {}", self.config.input_dir);
        let mut offers = crate::models::load_all_json_files(&self.config.input_dir).await?;

        if let Some(limit) = self.config.max_offers {
            if offers.len() > limit {
                info!("✂️ 只处理前 {} 个活动（共 {} 个）", limit, offers.len());
                offers.truncate(limit);
            }
        }

        let settings = GradingSettings {
            max_images: self.config.max_images,
            instructions: GRADING_INSTRUCTIONS.to_string(),
            verbose_logging: self.config.verbose_logging,
        };
        let mut batch = GradingBatch::new(
            Arc::clone(&self.llm_service),
            settings,
            self.config.grading_concurrency,
        );
        let outcome = batch.run(offers).await;

        self.csv_writer.write(&outcome.results).await?;

        let stats = outcome.stats;
        print_final_stats(
            stats.graded,
            stats.parse_failed,
            stats.service_failed,
            stats.excluded,
            self.csv_writer.output_path(),
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::services::llm_service::{GradingReply, GradingRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GradingClient for CountingClient {
        async fn grade(&self, request: GradingRequest<'_>) -> Result<GradingReply, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = request
                .metadata
                .get("activity_id")
                .cloned()
                .unwrap_or_default();
            Ok(GradingReply {
                segments: vec![format!(r#"{{"score": 3, "reason": "ok {id}"}}"#)],
                request_id: Some(format!("req-{id}")),
            })
        }
    }

    fn offer(id: &str, status: Option<&str>) -> StructuredOffer {
        StructuredOffer {
            activity_id: id.to_string(),
            status: status.map(str::to_string),
            ..Default::default()
        }
    }

    fn new_batch(concurrency: usize) -> (GradingBatch<CountingClient>, Arc<CountingClient>) {
        let client = Arc::new(CountingClient {
            calls: AtomicUsize::new(0),
        });
        (
            GradingBatch::new(Arc::clone(&client), GradingSettings::default(), concurrency),
            client,
        )
    }

    #[tokio::test]
    async fn test_curated_offers_are_excluded() {
        let (mut batch, client) = new_batch(2);
        assert_eq!(batch.state(), BatchState::Idle);

        let outcome = batch
            .run(vec![
                offer("b", Some("pending")),
                offer("a", Some("CURATED")),
                offer("c", None),
                offer("d", Some("Curated")),
            ])
            .await;

        assert_eq!(batch.state(), BatchState::Done);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        let ids: Vec<&str> = outcome
            .results
            .iter()
            .map(|r| r.activity_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(outcome.stats.excluded, 2);
        assert_eq!(outcome.stats.graded, 2);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_calls() {
        let (mut batch, client) = new_batch(4);
        let outcome = batch.run(vec![offer("x", Some("curated"))]).await;

        assert!(outcome.results.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(batch.state(), BatchState::Done);

        let (mut batch, client) = new_batch(4);
        let outcome = batch.run(Vec::new()).await;
        assert!(outcome.results.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let (mut batch, client) = new_batch(0);
        let outcome = batch.run(vec![offer("1", None), offer("2", None)]).await;
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }
}
