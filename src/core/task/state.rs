use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::core::error::{CompressError, CompressResult};

/// 压缩任务状态（与服务端线上格式一致，小写）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// 终态：completed / failed 之后状态不再变化
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "排队中",
            TaskStatus::Running => "压缩中",
            TaskStatus::Completed => "已完成",
            TaskStatus::Failed => "失败",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 提交压缩任务后的回执
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub task_id: String,
    pub status: TaskStatus,
}

/// 任务详情（GET /v1/tasks/{task_id} 的响应体）
///
/// 除 task_id 以外所有字段以服务端为准，客户端从不修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    pub task_id: String,
    pub status: TaskStatus,
    pub original_filename: String,
    pub original_size_mb: f64,
    #[serde(default)]
    pub compressed_size_mb: Option<f64>,
    pub target_size_mb: f64,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub result_download_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl TaskDetail {
    /// 校验终态负载的互斥不变量
    ///
    /// completed 必须携带 compressed_size_mb 和 result_download_url，
    /// failed 必须携带 error_message，非终态三者都不能出现。
    pub fn check_integrity(&self) -> CompressResult<()> {
        match self.status {
            TaskStatus::Completed => {
                if self.compressed_size_mb.is_none() || self.result_download_url.is_none() {
                    return Err(CompressError::server(
                        "任务已完成但缺少压缩结果字段".to_string(),
                    ));
                }
                if self.error_message.is_some() {
                    return Err(CompressError::server(
                        "任务已完成但携带错误信息".to_string(),
                    ));
                }
            }
            TaskStatus::Failed => {
                if self.error_message.is_none() {
                    return Err(CompressError::server("任务失败但缺少错误信息".to_string()));
                }
                if self.compressed_size_mb.is_some() || self.result_download_url.is_some() {
                    return Err(CompressError::server(
                        "任务失败但携带压缩结果字段".to_string(),
                    ));
                }
            }
            _ => {
                if self.compressed_size_mb.is_some()
                    || self.result_download_url.is_some()
                    || self.error_message.is_some()
                {
                    return Err(CompressError::server(
                        "任务未结束但携带终态字段".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// 任务耗时（created_at 到 completed_at），时间戳无法解析时为 None
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let created = parse_timestamp(&self.created_at)?;
        let completed = parse_timestamp(self.completed_at.as_deref()?)?;
        Some(completed - created)
    }
}

/// 解析服务端时间戳，兼容带时区的 RFC3339 和不带时区的 ISO 格式
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    value.parse::<NaiveDateTime>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(status: TaskStatus) -> TaskDetail {
        TaskDetail {
            task_id: "abc123".to_string(),
            status,
            original_filename: "report.pdf".to_string(),
            original_size_mb: 10.0,
            compressed_size_mb: None,
            target_size_mb: 2.0,
            created_at: "2024-05-01T08:00:00".to_string(),
            completed_at: None,
            result_download_url: None,
            error_message: None,
        }
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(serde_json::to_string(&TaskStatus::Queued).unwrap(), "\"queued\"");
        assert_eq!(serde_json::to_string(&TaskStatus::Failed).unwrap(), "\"failed\"");
        let status: TaskStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(status, TaskStatus::Running);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn test_detail_deserialization() {
        let json = r#"{
            "task_id": "abc123",
            "status": "completed",
            "original_filename": "report.pdf",
            "original_size_mb": 10.0,
            "compressed_size_mb": 1.8,
            "target_size_mb": 2.0,
            "created_at": "2024-05-01T08:00:00.123456",
            "completed_at": "2024-05-01T08:00:42.000001",
            "result_download_url": "/api/v1/download/abc123"
        }"#;
        let detail: TaskDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.task_id, "abc123");
        assert_eq!(detail.status, TaskStatus::Completed);
        assert_eq!(detail.compressed_size_mb, Some(1.8));
        assert!(detail.error_message.is_none());
        assert!(detail.check_integrity().is_ok());
    }

    #[test]
    fn test_detail_deserialization_minimal() {
        // 非终态响应不携带可选字段
        let json = r#"{
            "task_id": "abc123",
            "status": "queued",
            "original_filename": "report.pdf",
            "original_size_mb": 10.0,
            "target_size_mb": 2.0,
            "created_at": "2024-05-01T08:00:00"
        }"#;
        let detail: TaskDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.status, TaskStatus::Queued);
        assert!(detail.compressed_size_mb.is_none());
        assert!(detail.result_download_url.is_none());
        assert!(detail.check_integrity().is_ok());
    }

    #[test]
    fn test_integrity_terminal_exclusive() {
        // completed 缺少结果字段
        let mut d = detail(TaskStatus::Completed);
        assert!(d.check_integrity().is_err());
        d.compressed_size_mb = Some(1.8);
        d.result_download_url = Some("/api/v1/download/abc123".to_string());
        assert!(d.check_integrity().is_ok());
        // completed 同时携带错误信息
        d.error_message = Some("boom".to_string());
        assert!(d.check_integrity().is_err());

        // failed 必须携带 error_message 且不携带结果
        let mut d = detail(TaskStatus::Failed);
        assert!(d.check_integrity().is_err());
        d.error_message = Some("Corrupt PDF".to_string());
        assert!(d.check_integrity().is_ok());
        d.compressed_size_mb = Some(1.8);
        assert!(d.check_integrity().is_err());
    }

    #[test]
    fn test_integrity_non_terminal_empty() {
        let mut d = detail(TaskStatus::Running);
        assert!(d.check_integrity().is_ok());
        d.result_download_url = Some("/files/abc123.pdf".to_string());
        assert!(d.check_integrity().is_err());
    }

    #[test]
    fn test_elapsed() {
        let mut d = detail(TaskStatus::Completed);
        d.completed_at = Some("2024-05-01T08:00:42".to_string());
        let elapsed = d.elapsed().unwrap();
        assert_eq!(elapsed.num_seconds(), 42);

        // 无 completed_at 时为 None
        let d = detail(TaskStatus::Running);
        assert!(d.elapsed().is_none());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-05-01T08:00:00").is_some());
        assert!(parse_timestamp("2024-05-01T08:00:00.123456").is_some());
        assert!(parse_timestamp("2024-05-01T08:00:00+00:00").is_some());
        assert!(parse_timestamp("昨天").is_none());
    }
}
