//! Core: 压缩服务客户端、任务轮询、错误处理等核心逻辑模块

pub mod client;
pub mod error;
pub mod task;

// 只导出主流程和其它模块实际用到的类型
pub use client::{ApiClient, CompressionApi, SubmitOptions};
pub use error::{CompressError, CompressResult};
pub use task::{TaskDetail, TaskPollerActor, TaskStatus, TaskView};
