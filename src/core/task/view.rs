use crate::core::task::state::{TaskDetail, TaskStatus};
use crate::ui::format_mb;

/// 任务视图：六种互斥的展示状态
///
/// 纯投影，不包含任何状态迁移逻辑。输入是"最近一次查询的
/// 结果"（可能还没有 / 可能出错 / 可能成功），输出唯一确定。
#[derive(Debug, Clone, PartialEq)]
pub enum TaskView {
    /// 第一次查询还没有返回
    Loading,
    /// 查询本身失败（网络/404），不等于任务失败
    FetchError(String),
    Queued {
        filename: String,
        original_mb: f64,
        target_mb: f64,
    },
    Running {
        filename: String,
        original_mb: f64,
        target_mb: f64,
    },
    Completed {
        filename: String,
        original_mb: f64,
        compressed_mb: Option<f64>,
        download_url: Option<String>,
    },
    Failed {
        filename: String,
        message: String,
    },
}

impl TaskView {
    /// 由查询结果投影出视图
    pub fn project(fetch_error: Option<&str>, detail: Option<&TaskDetail>) -> TaskView {
        if let Some(msg) = fetch_error {
            return TaskView::FetchError(msg.to_string());
        }
        let detail = match detail {
            Some(d) => d,
            None => return TaskView::Loading,
        };
        match detail.status {
            TaskStatus::Queued => TaskView::Queued {
                filename: detail.original_filename.clone(),
                original_mb: detail.original_size_mb,
                target_mb: detail.target_size_mb,
            },
            TaskStatus::Running => TaskView::Running {
                filename: detail.original_filename.clone(),
                original_mb: detail.original_size_mb,
                target_mb: detail.target_size_mb,
            },
            TaskStatus::Completed => TaskView::Completed {
                filename: detail.original_filename.clone(),
                original_mb: detail.original_size_mb,
                compressed_mb: detail.compressed_size_mb,
                download_url: detail.result_download_url.clone(),
            },
            TaskStatus::Failed => TaskView::Failed {
                filename: detail.original_filename.clone(),
                message: detail
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "未知原因".to_string()),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskView::Completed { .. } | TaskView::Failed { .. })
    }

    /// 一行标题，进度界面的主信息
    pub fn headline(&self) -> String {
        match self {
            TaskView::Loading => "正在加载任务信息...".to_string(),
            TaskView::FetchError(msg) => format!("无法加载任务信息: {}", msg),
            TaskView::Queued { filename, .. } => format!("任务排队中 - {}", filename),
            TaskView::Running { filename, .. } => format!("正在压缩... - {}", filename),
            TaskView::Completed { filename, .. } => format!("压缩完成 - {}", filename),
            TaskView::Failed { message, .. } => format!("压缩失败: {}", message),
        }
    }

    /// 尺寸明细行，仅在有任务数据时存在
    pub fn detail_line(&self) -> Option<String> {
        match self {
            TaskView::Queued { original_mb, target_mb, .. }
            | TaskView::Running { original_mb, target_mb, .. } => Some(format!(
                "原始大小: {} | 目标大小: {}",
                format_mb(*original_mb),
                format_mb(*target_mb)
            )),
            TaskView::Completed { original_mb, compressed_mb, .. } => {
                let compressed = compressed_mb
                    .map(format_mb)
                    .unwrap_or_else(|| "未知".to_string());
                Some(format!(
                    "原始大小: {} | 压缩后大小: {}",
                    format_mb(*original_mb),
                    compressed
                ))
            }
            _ => None,
        }
    }
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
    fn test_project_loading() {
        assert_eq!(TaskView::project(None, None), TaskView::Loading);
    }

    #[test]
    fn test_project_fetch_error_wins() {
        // 查询错误优先于任何缓存数据
        let d = detail(TaskStatus::Running);
        let view = TaskView::project(Some("网络错误: timeout"), Some(&d));
        assert!(matches!(view, TaskView::FetchError(_)));
    }

    #[test]
    fn test_project_queued_and_running() {
        let view = TaskView::project(None, Some(&detail(TaskStatus::Queued)));
        assert!(matches!(view, TaskView::Queued { .. }));
        assert_eq!(
            view.detail_line().unwrap(),
            "原始大小: 10.00 MB | 目标大小: 2.00 MB"
        );

        let view = TaskView::project(None, Some(&detail(TaskStatus::Running)));
        assert!(matches!(view, TaskView::Running { .. }));
        assert!(!view.is_terminal());
    }

    #[test]
    fn test_project_completed() {
        let mut d = detail(TaskStatus::Completed);
        d.compressed_size_mb = Some(1.8);
        d.result_download_url = Some("/files/abc123.pdf".to_string());
        let view = TaskView::project(None, Some(&d));
        assert!(view.is_terminal());
        assert_eq!(
            view.detail_line().unwrap(),
            "原始大小: 10.00 MB | 压缩后大小: 1.80 MB"
        );
        match view {
            TaskView::Completed { download_url, .. } => {
                assert_eq!(download_url.as_deref(), Some("/files/abc123.pdf"));
            }
            _ => panic!("期望 Completed 视图"),
        }
    }

    #[test]
    fn test_project_failed() {
        let mut d = detail(TaskStatus::Failed);
        d.error_message = Some("Corrupt PDF".to_string());
        let view = TaskView::project(None, Some(&d));
        assert!(view.is_terminal());
        assert_eq!(view.headline(), "压缩失败: Corrupt PDF");
        assert!(view.detail_line().is_none());
    }

    #[test]
    fn test_project_failed_without_message() {
        let view = TaskView::project(None, Some(&detail(TaskStatus::Failed)));
        match view {
            TaskView::Failed { message, .. } => assert_eq!(message, "未知原因"),
            _ => panic!("期望 Failed 视图"),
        }
    }
}
