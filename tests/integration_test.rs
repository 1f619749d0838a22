use async_trait::async_trait;
use offer_grader::error::LlmError;
use offer_grader::models::load_all_json_files;
use offer_grader::orchestrator::BatchState;
use offer_grader::services::CsvWriter;
use offer_grader::{GradingBatch, GradingClient, GradingReply, GradingRequest, GradingSettings};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

/// 按活动 ID 返回不同回复，并随机延迟以打乱完成顺序
struct ScriptedClient;

#[async_trait]
impl GradingClient for ScriptedClient {
    async fn grade(&self, request: GradingRequest<'_>) -> Result<GradingReply, LlmError> {
        let id = request
            .metadata
            .get("activity_id")
            .cloned()
            .unwrap_or_default();

        let delay = id.bytes().map(u64::from).sum::<u64>() % 7;
        tokio::time::sleep(Duration::from_millis(delay * 3)).await;

        let text = match id.as_str() {
            "100" => json!({
                "score": 4.5,
                "reason": "Clear itinerary, strong photos",
                "categories": ["Tours", "Food"],
                "target_audiences": ["Couples"],
                "hero_image_index": 2,
                "hero_image_url": "https://cdn.test/100/1.jpg",
                "hero_image_reason": "Best light"
            })
            .to_string(),
            "200" => format!(
                "Sure! {}",
                json!({
                    "score": 12,
                    "reason": "Great",
                    "hero_image_url": "https://cdn.test/200/nested.jpg"
                })
            ),
            "300" => "I am unable to grade this listing.".to_string(),
            "400" => return Err(LlmError::api_call_failed("mock", "503 Service Unavailable")),
            _ => json!({"score": 1, "reason": "Thin content"}).to_string(),
        };

        Ok(GradingReply {
            segments: vec![text],
            request_id: Some(format!("req-{id}")),
        })
    }
}

fn write_offer(dir: &Path, file: &str, activity: serde_json::Value) {
    let document = json!({ "activity": activity });
    std::fs::write(dir.join(file), document.to_string()).expect("写入测试文件失败");
}

fn seed_offers(dir: &Path) {
    write_offer(
        dir,
        "a.json",
        json!({
            "id": 300,
            "title": "Harbour cruise",
            "images": [{"url": "https://cdn.test/300/1.jpg"}]
        }),
    );
    write_offer(
        dir,
        "b.json",
        json!({
            "id": "100",
            "title": "Old town food walk",
            "cities": [{"name": "Lisbon", "country": {"name": "Portugal"}}],
            "category_metadata": {"sub_category": {"name": "Food tours"}},
            "sections": [{"name": "Overview", "groups": [{"name": "What to expect", "content": "Tastings"}]}],
            "images": [
                {"url": "https://cdn.test/100/1.jpg", "type": "cover"},
                {"url": "https://cdn.test/100/2.jpg", "alt": "Pastries"}
            ]
        }),
    );
    write_offer(
        dir,
        "c.json",
        json!({
            "id": "200",
            "images": [
                {"url": "https://cdn.test/200/1.jpg",
                 "images": [{"url": "https://cdn.test/200/nested.jpg"}]}
            ]
        }),
    );
    write_offer(
        dir,
        "d.json",
        json!({"id": "400", "title": "Sunset kayak"}),
    );
    write_offer(
        dir,
        "e.json",
        json!({"id": "500", "category_metadata": {"curation_status": "Curated"}}),
    );
    write_offer(dir, "f.json", json!({"id": "050"}));
    std::fs::write(dir.join("broken.json"), "{ not json").expect("写入测试文件失败");
    std::fs::write(dir.join("notes.txt"), "ignored").expect("写入测试文件失败");
}

fn writer() -> CsvWriter {
    CsvWriter::new(
        "unused.csv",
        "https://offers.test/t{id}",
        "https://logs.test/{request_id}",
    )
}

async fn grade_with(concurrency: usize, dir: &Path) -> String {
    let folder = dir.to_string_lossy().to_string();
    let offers = assert_ok!(load_all_json_files(&folder).await);

    let mut batch = GradingBatch::new(
        Arc::new(ScriptedClient),
        GradingSettings::default(),
        concurrency,
    );
    let outcome = batch.run(offers).await;
    assert_eq!(batch.state(), BatchState::Done);

    assert_eq!(outcome.stats.excluded, 1);
    assert_eq!(outcome.stats.graded, 3);
    assert_eq!(outcome.stats.parse_failed, 1);
    assert_eq!(outcome.stats.service_failed, 1);

    writer().render(&outcome.results)
}

#[tokio::test]
async fn test_output_is_independent_of_worker_count() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    seed_offers(dir.path());

    let sequential = grade_with(1, dir.path()).await;
    let parallel = grade_with(4, dir.path()).await;
    assert_eq!(sequential, parallel);

    let ids: Vec<&str> = sequential
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap_or_default())
        .collect();
    assert_eq!(ids, vec!["050", "100", "200", "300", "400"]);
}

#[tokio::test]
async fn test_rows_reflect_reconciled_replies() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    seed_offers(dir.path());

    let csv = grade_with(3, dir.path()).await;
    let rows: Vec<&str> = csv.lines().collect();

    // 编号优先于返回的 URL
    assert_eq!(
        rows[2],
        "100,https://offers.test/t100,2,https://cdn.test/100/2.jpg,Best light,Tours; Food,Couples,4.5,\"Clear itinerary, strong photos\",https://logs.test/req-100"
    );
    // 分数截断到 5，只有 URL 时反查编号（嵌套图片排在主图之后）
    assert_eq!(
        rows[3],
        "200,https://offers.test/t200,2,https://cdn.test/200/nested.jpg,,,,5,Great,https://logs.test/req-200"
    );
    assert!(rows[4].starts_with("300,https://offers.test/t300,,,,,,,Failed to parse grading response: I am unable"));
    assert!(rows[4].ends_with(",https://logs.test/req-300"));
    assert!(rows[5].starts_with("400,https://offers.test/t400,,,,,,,Grading request failed:"));
    assert!(rows[5].ends_with(','));
    assert!(!csv.contains("500,"));
}

#[tokio::test]
async fn test_missing_input_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let missing = dir.path().join("does-not-exist");
    let result = load_all_json_files(&missing.to_string_lossy()).await;
    assert!(result.is_err());
}
