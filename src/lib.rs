//! PdfSquash: PDF 压缩服务的命令行客户端
//!
//! 压缩引擎在服务端，客户端只做三件事：提交文件、轮询任务状态、
//! 下载压缩结果。对应三种运行方式：
//! - `pdfsquash <file.pdf> -s 2` 提交并跟踪
//! - `pdfsquash --watch <任务ID>` 跟踪已有任务
//! - `pdfsquash --result <任务ID>` 获取结果并下载

pub mod cli;
pub mod config;
pub mod core;
pub mod ui;
pub mod utils;
