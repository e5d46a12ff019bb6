//! `task` 模块包含了与单个压缩任务相关的所有逻辑
//!
//! 主要包括：
//! - `state`: 任务状态 `TaskStatus` 和线上数据模型 `TaskDetail`
//! - `poller`: 轮询控制器 `TaskPollerActor`
//! - `view`: 视图投影 `TaskView`

pub mod poller;
pub mod state;
pub mod view;

// 导出核心组件，方便外部使用
pub use poller::{CancelPolling, PollSnapshot, QueryView, StartPolling, TaskPollerActor};
pub use state::{SubmitReceipt, TaskDetail, TaskStatus};
pub use view::TaskView;
