use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 评分服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 找不到 API 密钥（环境变量和候选文件都没有）
    #[error("找不到凭证 {var_name}（已检查环境变量和文件: {searched}）")]
    MissingCredential { var_name: String, searched: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 读取文件或目录失败
    #[error("读取失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 记录缺少顶层 activity 对象
    #[error("缺少顶层 activity 对象: {path}")]
    MissingActivity { path: String },
}

/// 评分服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 构建请求失败
    #[error("构建请求失败 (模型: {model}): {message}")]
    RequestBuildFailed { model: String, message: String },
    /// API 调用失败
    #[error("API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

impl LlmError {
    /// 创建 API 调用错误
    pub fn api_call_failed(model: impl Into<String>, err: impl std::fmt::Display) -> Self {
        LlmError::ApiCallFailed {
            model: model.into(),
            message: err.to_string(),
        }
    }

    /// 创建请求构建错误
    pub fn request_build_failed(model: impl Into<String>, err: impl std::fmt::Display) -> Self {
        LlmError::RequestBuildFailed {
            model: model.into(),
            message: err.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
