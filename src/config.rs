use crate::error::{AppResult, ConfigError};
use std::path::PathBuf;

/// 凭证所在的环境变量名（也是候选文件中查找的键）
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时评分的活动数量（worker 数）
    pub grading_concurrency: usize,
    /// 每个活动最多发送的图片数量
    pub max_images: usize,
    /// 最多处理多少个活动（None 表示全部）
    pub max_offers: Option<usize>,
    /// 活动 JSON 文件存放目录
    pub input_dir: String,
    /// 输出 CSV 文件
    pub output_csv: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_reasoning_effort: String,
    pub llm_max_output_tokens: u32,
    /// 未设置环境变量时依次查找的凭证文件
    pub credential_files: Vec<PathBuf>,
    // --- 导出链接模板 ---
    pub activity_url_template: String,
    pub log_url_template: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grading_concurrency: 4,
            max_images: 8,
            max_offers: None,
            input_dir: "data/activities".to_string(),
            output_csv: "output/offer_grades.csv".to_string(),
            verbose_logging: false,
            llm_api_key: None,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-5-mini".to_string(),
            llm_reasoning_effort: "low".to_string(),
            llm_max_output_tokens: 4096,
            credential_files: vec![PathBuf::from(".env"), PathBuf::from(".env.local")],
            activity_url_template: "https://www.getyourguide.com/-t{id}".to_string(),
            log_url_template: "https://platform.openai.com/logs/{request_id}".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            grading_concurrency: env_parse("GRADER_CONCURRENCY")
                .filter(|n: &usize| *n >= 1)
                .unwrap_or(default.grading_concurrency),
            max_images: env_parse("GRADER_MAX_IMAGES").unwrap_or(default.max_images),
            max_offers: env_parse("GRADER_MAX_OFFERS").or(default.max_offers),
            input_dir: std::env::var("OFFERS_INPUT_DIR").unwrap_or(default.input_dir),
            output_csv: std::env::var("GRADES_OUTPUT_CSV").unwrap_or(default.output_csv),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var(API_KEY_VAR)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            llm_api_base_url: std::env::var("OPENAI_API_BASE").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("GRADER_MODEL").unwrap_or(default.llm_model_name),
            llm_reasoning_effort: std::env::var("GRADER_REASONING_EFFORT")
                .unwrap_or(default.llm_reasoning_effort),
            llm_max_output_tokens: env_parse("GRADER_MAX_OUTPUT_TOKENS")
                .filter(|n: &u32| *n >= 1)
                .unwrap_or(default.llm_max_output_tokens),
            credential_files: std::env::var("GRADER_CREDENTIAL_FILES")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or(default.credential_files),
            activity_url_template: std::env::var("ACTIVITY_URL_TEMPLATE")
                .unwrap_or(default.activity_url_template),
            log_url_template: std::env::var("LOG_URL_TEMPLATE").unwrap_or(default.log_url_template),
        }
    }

    /// 解析 API 密钥
    ///
    /// 优先使用环境变量，其次按顺序查找候选文件中第一行 `OPENAI_API_KEY=...`
    pub fn resolve_api_key(&self) -> AppResult<String> {
        if let Some(key) = &self.llm_api_key {
            return Ok(key.clone());
        }

        for path in &self.credential_files {
            let Ok(content) = std::fs::read_to_string(path) else {
                continue;
            };
            if let Some(key) = find_key_in_env_file(&content, API_KEY_VAR) {
                tracing::debug!("从 {} 读取到凭证", path.display());
                return Ok(key);
            }
        }

        let searched = self
            .credential_files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ConfigError::MissingCredential {
            var_name: API_KEY_VAR.to_string(),
            searched,
        }
        .into())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// 在 `KEY=value` 格式的文本中查找指定键
///
/// 忽略空行和 `#` 注释，去掉值两侧的引号，空值视为不存在
pub fn find_key_in_env_file(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (name, value) = line.split_once('=')?;
        if name.trim() != key {
            return None;
        }
        let value = value
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}
