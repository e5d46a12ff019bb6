use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{CompressError, CompressResult};
use crate::utils::validator;

/// 配置结构体
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// 压缩服务 API 基地址
    pub api_base: String,
    /// 状态轮询间隔（毫秒），从上一次查询结束起计
    pub poll_interval_ms: u64,
    /// 任务完成后跳转到结果阶段前的延迟（毫秒）
    pub redirect_delay_ms: u64,
    /// 网络超时时间（秒）
    pub timeout: u64,
    /// User-Agent
    pub user_agent: String,
    /// 压缩结果保存目录
    pub download_dir: String,
    /// 压缩最低质量（1-100），传给服务端
    pub min_quality: u32,
    /// 压缩最大迭代次数（1-20），传给服务端
    pub max_iterations: u32,
    /// 是否保留 PDF 元数据
    pub preserve_metadata: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000/api".to_string(),
            poll_interval_ms: 2000,
            redirect_delay_ms: 1000,
            timeout: 30,
            user_agent: "PdfSquash/0.1".to_string(),
            download_dir: "./downloads".to_string(),
            min_quality: 20,
            max_iterations: 6,
            preserve_metadata: false,
        }
    }
}

impl Config {
    /// 加载配置文件，不存在或格式错误时回落到默认配置并写回
    pub fn load(path: &str) -> CompressResult<Self> {
        if Path::new(path).exists() {
            let content = fs::read_to_string(path)?;
            match toml::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    eprintln!("配置文件格式错误: {}，将使用默认配置", e);
                    let config = Config::default();
                    config.save_with_tutorial(path)?;
                    Ok(config)
                }
            }
        } else {
            let config = Config::default();
            config.save_with_tutorial(path)?;
            Ok(config)
        }
    }

    /// 保存带教程的配置文件（唯一写入方法）
    pub fn save_with_tutorial(&self, path: &str) -> CompressResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        let tutorial_content = Config::generate_tutorial_content();
        let config_content = toml::to_string_pretty(self)
            .map_err(|e| CompressError::unknown(format!("无法序列化配置: {}", e)))?;
        let full_content = format!("{}\n\n{}", tutorial_content, config_content);
        fs::write(path, full_content)?;
        Ok(())
    }

    /// 生成配置文件教程内容（静态方法）
    fn generate_tutorial_content() -> String {
        r#"# PdfSquash 配置文件
# ====================
#
# 这是一个 TOML 格式的配置文件，用于配置 PdfSquash 压缩客户端的行为。
# 压缩本身在服务端完成，客户端只负责提交文件、轮询进度和下载结果。
#
# 配置文件位置：
# - Windows: %APPDATA%/pdfsquash/pdfsquash.conf
# - macOS: ~/Library/Application Support/pdfsquash/pdfsquash.conf
# - Linux: ~/.config/pdfsquash/pdfsquash.conf
#
# 命令行参数会覆盖配置文件中的设置，优先级：命令行 > 配置文件 > 默认值
#
# 使用示例：
#   pdfsquash report.pdf -s 2                # 压缩到 2MB
#   pdfsquash --watch <任务ID>                # 查看已有任务的进度
#   pdfsquash --result <任务ID>               # 获取结果并下载
#   pdfsquash -e                             # 编辑配置文件

# ==================== 服务设置 ====================

# 压缩服务 API 基地址
# 任务提交到 {api_base}/v1/compress，状态查询 {api_base}/v1/tasks/{task_id}
api_base = "http://127.0.0.1:8000/api"

# 网络超时时间（秒）
timeout = 30

# User-Agent 字符串
user_agent = "PdfSquash/0.1"

# ==================== 轮询设置 ====================

# 状态轮询间隔（毫秒）
# 从上一次查询结束起计，同一任务同时最多只有一个查询在途
poll_interval_ms = 2000

# 任务完成后跳转到结果阶段前的延迟（毫秒）
redirect_delay_ms = 1000

# ==================== 压缩参数 ====================
# 以下参数随任务一起提交，由服务端的压缩引擎解释

# 压缩最低质量（1-100）
min_quality = 20

# 压缩最大迭代次数（1-20）
max_iterations = 6

# 是否保留 PDF 元数据
preserve_metadata = false

# ==================== 下载设置 ====================

# 压缩结果保存目录
download_dir = "./downloads"

# ==================== 故障排除 ====================
#
# 问题：提交后一直排队
# 解决：服务端队列繁忙，任务不会丢，可以用 --watch <任务ID> 随时回来查看
#
# 问题：轮询中途报网络错误
# 解决：轮询会停止，任务在服务端继续执行，用 --watch <任务ID> 重新进入
#
# 问题：压缩结果比目标大小大
# 解决：降低 min_quality 或增加 max_iterations 后重新提交
"#
        .to_string()
    }

    /// 校验配置合法性
    pub fn validate(&self) -> CompressResult<()> {
        if !validator::is_valid_api_base(&self.api_base) {
            return Err(CompressError::config(format!(
                "api_base 不是合法的 http(s) 地址: {}",
                self.api_base
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(CompressError::config("轮询间隔必须大于0"));
        }
        if self.timeout == 0 {
            return Err(CompressError::config("超时时间必须大于0"));
        }
        if self.download_dir.is_empty() {
            return Err(CompressError::config("下载目录不能为空"));
        }
        if self.min_quality == 0 || self.min_quality > 100 {
            return Err(CompressError::config("min_quality 必须在 1-100 之间"));
        }
        if self.max_iterations == 0 || self.max_iterations > 20 {
            return Err(CompressError::config("max_iterations 必须在 1-20 之间"));
        }
        Ok(())
    }

    /// 合并命令行参数到配置
    pub fn merge_from_args(&mut self, args: &crate::cli::Args) {
        // 命令行参数覆盖配置文件
        if let Some(api_base) = &args.api_base {
            self.api_base = api_base.clone();
        }
        if let Some(download_dir) = &args.download_dir {
            self.download_dir = download_dir.clone();
        }
        if let Some(min_quality) = args.min_quality {
            self.min_quality = min_quality;
        }
        if let Some(max_iterations) = args.max_iterations {
            self.max_iterations = max_iterations;
        }
        if args.preserve_metadata {
            self.preserve_metadata = true;
        }
        if let Some(interval) = args.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
    }

    /// 获取配置摘要信息
    pub fn get_summary(&self) -> String {
        format!(
            "配置摘要:\n\
            - 服务地址: {}\n\
            - 轮询间隔: {} 毫秒\n\
            - 超时时间: {} 秒\n\
            - 下载目录: {}\n\
            - 最低质量: {}\n\
            - 最大迭代: {}\n\
            - 保留元数据: {}",
            self.api_base,
            self.poll_interval_ms,
            self.timeout,
            self.download_dir,
            self.min_quality,
            self.max_iterations,
            if self.preserve_metadata { "是" } else { "否" }
        )
    }
}
