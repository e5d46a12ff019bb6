//! CLI: 命令行接口和参数解析模块
//!
//! ## 主要功能
//!
//! - 命令行参数解析和验证
//! - 配置文件路径管理
//! - 运行模式推导（提交 / 跟踪进度 / 获取结果）
//! - 平台特定的路径处理
//! - 配置文件编辑器集成
//!
//! ## 支持的命令
//!
//! - 提交压缩：`pdfsquash report.pdf -s 2`
//! - 跟踪进度：`pdfsquash --watch <任务ID>`
//! - 获取结果：`pdfsquash --result <任务ID>`
//! - 编辑配置：`pdfsquash -e`
//! - 指定配置：`pdfsquash -c config.conf report.pdf`
//!
//! ## 平台支持
//!
//! - Windows: `%APPDATA%/pdfsquash/pdfsquash.conf`
//! - macOS: `~/Library/Application Support/pdfsquash/pdfsquash.conf`
//! - Linux: `~/.config/pdfsquash/pdfsquash.conf`

use std::env;
use std::path::Path;

use clap::Parser;

use crate::config::Config;
use crate::core::error::{CompressError, CompressResult};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (构建于 ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")"
);

/// 获取平台默认配置文件路径
pub fn default_config_path() -> String {
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        format!("{}/pdfsquash/pdfsquash.conf", appdata)
    }
    #[cfg(target_os = "macos")]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/Library/Application Support/pdfsquash/pdfsquash.conf", home)
    }
    #[cfg(target_os = "linux")]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/.config/pdfsquash/pdfsquash.conf", home)
    }
}

/// 打开配置文件编辑器
pub fn open_config_in_editor(config_path: &str) {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("notepad").arg(config_path).status().ok();
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg("-e").arg(config_path).status().ok();
    }
    #[cfg(target_os = "linux")]
    {
        // 优先 xdg-open，否则 nano
        if std::process::Command::new("xdg-open").arg(config_path).status().is_err() {
            let _ = std::process::Command::new("nano").arg(config_path).status();
        }
    }
}

/// PdfSquash 命令行参数
///
/// 示例用法：
///   pdfsquash report.pdf -s 2
///   pdfsquash --watch abc123
///   pdfsquash --result abc123
///   pdfsquash -e  # 编辑配置文件
///
/// 更多用法请加 --help 查看
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pdfsquash",
    author = "panzhifu",
    version = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    about = "一个用 Rust 编写的 PDF 压缩服务命令行客户端",
    long_about = "把 PDF 提交给压缩服务、轮询任务进度并下载压缩结果的命令行客户端。\n\n示例：\n  pdfsquash report.pdf -s 2\n  pdfsquash --watch abc123\n  pdfsquash --result abc123\n  pdfsquash -e\n"
)]
pub struct Args {
    /// 要压缩的 PDF 文件路径
    #[arg(required = false, help = "要压缩的 PDF 文件路径。")]
    pub pdf: Option<String>,

    /// 目标大小（MB），必须大于 0
    #[arg(short = 's', long, default_value_t = 2.0, help = "压缩目标大小（MB），必须大于 0。")]
    pub target_size_mb: f64,

    /// 跟踪已有任务的进度
    #[arg(short = 'w', long, help = "按任务ID跟踪已有任务的进度。", value_name = "任务ID")]
    pub watch: Option<String>,

    /// 获取已有任务的结果并下载
    #[arg(short = 'r', long, help = "按任务ID获取压缩结果并下载。", value_name = "任务ID")]
    pub result: Option<String>,

    /// 配置文件路径，默认为平台推荐路径
    #[arg(short = 'c', long, default_value_t = default_config_path(), help = "配置文件路径，默认为平台推荐路径。")]
    pub config: String,

    /// 编辑配置文件（-e 或 --edit）
    #[arg(short = 'e', long = "edit", help = "用系统默认编辑器打开配置文件并退出。")]
    pub edit_config: bool,

    /// 压缩服务 API 基地址
    #[arg(long, help = "压缩服务 API 基地址，覆盖配置文件中的设置。")]
    pub api_base: Option<String>,

    /// 压缩结果保存目录
    #[arg(short = 'd', long, help = "压缩结果保存目录，覆盖配置文件中的设置。")]
    pub download_dir: Option<String>,

    /// 状态轮询间隔（毫秒）
    #[arg(long, help = "状态轮询间隔（毫秒），覆盖配置文件中的设置。")]
    pub poll_interval_ms: Option<u64>,

    /// 压缩最低质量（1-100）
    #[arg(long, help = "压缩最低质量（1-100），传给服务端。")]
    pub min_quality: Option<u32>,

    /// 压缩最大迭代次数（1-20）
    #[arg(long, help = "压缩最大迭代次数（1-20），传给服务端。")]
    pub max_iterations: Option<u32>,

    /// 保留 PDF 元数据
    #[arg(long, help = "保留 PDF 元数据。")]
    pub preserve_metadata: bool,
}

/// 运行模式，由参数组合推导
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    /// 提交新任务并跟踪到结束
    Compress { pdf: String, target_size_mb: f64 },
    /// 跟踪已有任务（进度视图）
    Watch { task_id: String },
    /// 获取结果并下载（结果视图）
    Result { task_id: String },
}

impl Args {
    pub fn parse_args() -> CompressResult<(Self, Config)> {
        let args = Args::parse();

        // --edit 逻辑
        if args.edit_config {
            open_config_in_editor(&args.config);
            std::process::exit(0);
        }

        // 加载或创建配置文件
        let mut config = if Path::new(&args.config).exists() {
            Config::load(&args.config)
                .map_err(|e| CompressError::config(format!("无法读取配置文件: {}", e)))?
        } else {
            if let Some(parent) = Path::new(&args.config).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CompressError::config(format!("无法创建配置目录: {}", e)))?;
            }
            let config = Config::default();
            config
                .save_with_tutorial(&args.config)
                .map_err(|e| CompressError::config(format!("无法保存配置文件: {}", e)))?;
            config
        };

        // 合并命令行参数到配置
        config.merge_from_args(&args);

        // 验证配置
        config.validate()?;

        Ok((args, config))
    }

    /// 推导运行模式
    ///
    /// 文件路径、--watch、--result 三者互斥，必须且只能给一个。
    pub fn run_mode(&self) -> CompressResult<RunMode> {
        let given = [
            self.pdf.is_some(),
            self.watch.is_some(),
            self.result.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();

        if given == 0 {
            return Err(CompressError::validation(
                "请提供要压缩的 PDF 文件，或用 --watch/--result 指定任务ID",
            ));
        }
        if given > 1 {
            return Err(CompressError::validation(
                "文件路径、--watch、--result 只能指定一个",
            ));
        }

        if let Some(task_id) = &self.result {
            return Ok(RunMode::Result { task_id: task_id.clone() });
        }
        if let Some(task_id) = &self.watch {
            return Ok(RunMode::Watch { task_id: task_id.clone() });
        }
        Ok(RunMode::Compress {
            pdf: self.pdf.clone().unwrap_or_default(),
            target_size_mb: self.target_size_mb,
        })
    }
}
