use thiserror::Error;
use std::io;

/// 客户端错误类型
///
/// 服务端报告的任务失败（status = failed）不是错误，
/// 它是一次成功的查询，由视图层渲染为失败摘要。
#[derive(Error, Debug)]
pub enum CompressError {
    #[error("参数错误: {0}")]
    Validation(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("任务不存在: {0}")]
    NotFound(String),

    #[error("服务器错误: {0}")]
    Server(String),

    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("操作已取消")]
    Cancelled,

    #[error("未知错误: {0}")]
    Unknown(String),
}

impl CompressError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CompressError::Validation(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        CompressError::Network(msg.into())
    }

    pub fn not_found(task_id: impl Into<String>) -> Self {
        CompressError::NotFound(task_id.into())
    }

    pub fn server(msg: impl Into<String>) -> Self {
        CompressError::Server(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        CompressError::Config(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        CompressError::Unknown(msg.into())
    }

    /// 是否值得用户稍后重试（本客户端不自动重试）
    #[allow(dead_code)]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompressError::Network(_) | CompressError::Server(_)
        )
    }

    /// 是否为不可恢复的输入/配置问题
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CompressError::Validation(_) |
            CompressError::NotFound(_) |
            CompressError::Config(_)
        )
    }
}

impl From<String> for CompressError {
    fn from(error: String) -> Self {
        CompressError::Unknown(error)
    }
}

impl From<&str> for CompressError {
    fn from(error: &str) -> Self {
        CompressError::Unknown(error.to_string())
    }
}

pub type CompressResult<T> = Result<T, CompressError>;
