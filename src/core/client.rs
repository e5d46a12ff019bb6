use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use awc::http::{header, StatusCode};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use regex::Regex;
use url::Url;

use crate::config::Config;
use crate::core::error::{CompressError, CompressResult};
use crate::core::task::state::{SubmitReceipt, TaskDetail};
use crate::utils::validator;

/// 随任务提交的压缩参数
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub target_size_mb: f64,
    pub min_quality: u32,
    pub max_iterations: u32,
    pub preserve_metadata: bool,
}

impl SubmitOptions {
    pub fn from_config(config: &Config, target_size_mb: f64) -> Self {
        Self {
            target_size_mb,
            min_quality: config.min_quality,
            max_iterations: config.max_iterations,
            preserve_metadata: config.preserve_metadata,
        }
    }
}

/// 压缩服务访问接口
///
/// 轮询控制器只依赖这个 trait，测试里用脚本化的假实现驱动。
/// 查询不在内部重试，重试策略属于调用方。
#[async_trait(?Send)]
pub trait CompressionApi {
    /// 提交压缩任务，返回服务端分配的任务ID和初始状态
    async fn submit(&self, pdf_path: &str, opts: &SubmitOptions) -> CompressResult<SubmitReceipt>;

    /// 查询任务状态
    async fn fetch_status(&self, task_id: &str) -> CompressResult<TaskDetail>;
}

/// 压缩服务 HTTP 客户端
pub struct ApiClient {
    base: String,
    base_url: Url,
    timeout: Duration,
    user_agent: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> CompressResult<Self> {
        let base_url = Url::parse(&config.api_base)
            .map_err(|e| CompressError::config(format!("api_base 无法解析: {}", e)))?;
        Ok(Self {
            base: config.api_base.trim_end_matches('/').to_string(),
            base_url,
            timeout: Duration::from_secs(config.timeout),
            user_agent: config.user_agent.clone(),
        })
    }

    fn http(&self) -> awc::Client {
        awc::Client::builder()
            .timeout(self.timeout)
            .add_default_header((header::USER_AGENT, self.user_agent.clone()))
            .finish()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// 把服务端返回的下载链接解析为绝对地址
    ///
    /// result_download_url 通常是 "/api/v1/download/{id}" 这样的
    /// 站内绝对路径，相对 api_base 的主机解析。
    pub fn resolve_url(&self, link: &str) -> CompressResult<String> {
        if link.starts_with("http://") || link.starts_with("https://") {
            return Ok(link.to_string());
        }
        self.base_url
            .join(link)
            .map(|u| u.to_string())
            .map_err(|e| CompressError::server(format!("下载链接无法解析: {} ({})", link, e)))
    }

    /// 下载压缩结果到指定目录，返回保存路径和写入字节数
    ///
    /// 文件名优先取 Content-Disposition，取不到时用 fallback_name。
    pub async fn download_result(
        &self,
        link: &str,
        dest_dir: &str,
        fallback_name: &str,
    ) -> CompressResult<(PathBuf, u64)> {
        let url = self.resolve_url(link)?;
        let mut response = self
            .http()
            .get(url.as_str())
            .timeout(self.timeout * 10)
            .send()
            .await
            .map_err(|e| CompressError::network(format!("{:?}", e)))?;

        if !response.status().is_success() {
            return Err(CompressError::server(format!(
                "下载失败: HTTP {}",
                response.status()
            )));
        }

        let name = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| fallback_name.to_string());

        std::fs::create_dir_all(dest_dir)?;
        let path = Path::new(dest_dir).join(name);
        let mut file = std::fs::File::create(&path)?;
        let mut written = 0u64;

        while let Some(chunk) = response.next().await {
            let bytes = chunk.map_err(|e| CompressError::network(format!("{:?}", e)))?;
            file.write_all(&bytes)?;
            written += bytes.len() as u64;
        }
        file.flush()?;

        Ok((path, written))
    }
}

#[async_trait(?Send)]
impl CompressionApi for ApiClient {
    async fn submit(&self, pdf_path: &str, opts: &SubmitOptions) -> CompressResult<SubmitReceipt> {
        // 本地前置校验，不消耗网络请求
        validator::validate_target_size_mb(opts.target_size_mb)?;
        validator::validate_pdf_path(pdf_path)?;

        let content = std::fs::read(pdf_path)?;
        if content.is_empty() {
            return Err(CompressError::validation(format!("文件为空: {}", pdf_path)));
        }
        let filename = Path::new(pdf_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.pdf")
            .to_string();

        let fields = [
            ("target_size_mb", opts.target_size_mb.to_string()),
            ("min_quality", opts.min_quality.to_string()),
            ("max_iterations", opts.max_iterations.to_string()),
            ("preserve_metadata", opts.preserve_metadata.to_string()),
        ];
        let boundary = make_boundary();
        let body = build_multipart(&boundary, &filename, &content, &fields);

        let mut response = self
            .http()
            .post(self.endpoint("v1/compress"))
            .content_type(format!("multipart/form-data; boundary={}", boundary))
            .send_body(body)
            .await
            .map_err(|e| CompressError::network(format!("{:?}", e)))?;

        if !response.status().is_success() {
            log::error!("提交任务失败: HTTP {}", response.status());
            return Err(CompressError::server(format!(
                "提交任务失败: HTTP {}",
                response.status()
            )));
        }

        response
            .json::<SubmitReceipt>()
            .await
            .map_err(|e| CompressError::server(format!("响应解析失败: {:?}", e)))
    }

    async fn fetch_status(&self, task_id: &str) -> CompressResult<TaskDetail> {
        validator::validate_task_id(task_id)?;

        let mut response = self
            .http()
            .get(self.endpoint(&format!("v1/tasks/{}", task_id)))
            .send()
            .await
            .map_err(|e| CompressError::network(format!("{:?}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CompressError::not_found(task_id));
        }
        if !response.status().is_success() {
            return Err(CompressError::server(format!(
                "查询任务失败: HTTP {}",
                response.status()
            )));
        }

        let detail = response
            .json::<TaskDetail>()
            .await
            .map_err(|e| CompressError::server(format!("响应解析失败: {:?}", e)))?;

        // 终态负载不变量以服务端为准，不一致时只记日志
        if let Err(e) = detail.check_integrity() {
            log::warn!("任务 {} 响应不一致: {}", detail.task_id, e);
        }

        Ok(detail)
    }
}

fn make_boundary() -> String {
    format!(
        "----pdfsquash{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

/// 手工构造 multipart/form-data 请求体
fn build_multipart(
    boundary: &str,
    filename: &str,
    file_bytes: &[u8],
    fields: &[(&str, String)],
) -> Bytes {
    let mut body = BytesMut::new();

    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(b"\r\n");

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body.freeze()
}

fn filename_from_disposition(value: &str) -> Option<String> {
    let re = Regex::new(r#"filename="?([^";]+)"?"#).ok()?;
    re.captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CompressError;

    fn client() -> ApiClient {
        ApiClient::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let c = client();
        assert_eq!(
            c.endpoint("v1/compress"),
            "http://127.0.0.1:8000/api/v1/compress"
        );
        assert_eq!(
            c.endpoint("/v1/tasks/abc123"),
            "http://127.0.0.1:8000/api/v1/tasks/abc123"
        );

        // 基地址尾部斜杠不影响拼接
        let mut config = Config::default();
        config.api_base = "http://127.0.0.1:8000/api/".to_string();
        let c = ApiClient::new(&config).unwrap();
        assert_eq!(
            c.endpoint("v1/compress"),
            "http://127.0.0.1:8000/api/v1/compress"
        );
    }

    #[test]
    fn test_resolve_url() {
        let c = client();
        // 站内绝对路径相对主机解析
        assert_eq!(
            c.resolve_url("/api/v1/download/abc123").unwrap(),
            "http://127.0.0.1:8000/api/v1/download/abc123"
        );
        // 完整地址原样返回
        assert_eq!(
            c.resolve_url("https://cdn.example.com/files/abc123.pdf").unwrap(),
            "https://cdn.example.com/files/abc123.pdf"
        );
    }

    #[test]
    fn test_build_multipart() {
        let fields = [("target_size_mb", "2".to_string())];
        let body = build_multipart("----b", "report.pdf", b"%PDF-1.4", &fields);
        let text = String::from_utf8_lossy(&body);

        assert!(text.contains("Content-Disposition: form-data; name=\"file\"; filename=\"report.pdf\""));
        assert!(text.contains("Content-Type: application/pdf"));
        assert!(text.contains("%PDF-1.4"));
        assert!(text.contains("Content-Disposition: form-data; name=\"target_size_mb\""));
        assert!(text.contains("\r\n2\r\n"));
        assert!(text.ends_with("------b--\r\n"));
        // 两个部分加收尾，共三个边界
        assert_eq!(text.matches("------b").count(), 3);
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="compressed_report.pdf""#),
            Some("compressed_report.pdf".to_string())
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=plain.pdf"),
            Some("plain.pdf".to_string())
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }

    #[test]
    fn test_submit_rejected_locally_before_network() {
        // 目标大小非法时在本地拒绝，不发出任何请求
        let c = client();
        let opts = SubmitOptions {
            target_size_mb: 0.0,
            min_quality: 20,
            max_iterations: 6,
            preserve_metadata: false,
        };
        let result = tokio_test::block_on(c.submit("whatever.pdf", &opts));
        assert!(matches!(result, Err(CompressError::Validation(_))));

        // 文件不存在同样在本地拒绝
        let opts = SubmitOptions { target_size_mb: 2.0, ..opts };
        let result = tokio_test::block_on(c.submit("./no_such_file.pdf", &opts));
        assert!(matches!(result, Err(CompressError::Validation(_))));
    }

    #[test]
    fn test_fetch_status_empty_id_rejected_locally() {
        let c = client();
        let result = tokio_test::block_on(c.fetch_status(""));
        assert!(matches!(result, Err(CompressError::Validation(_))));
    }

    #[test]
    fn test_api_client_rejects_bad_base() {
        let mut config = Config::default();
        config.api_base = "::not a url::".to_string();
        assert!(ApiClient::new(&config).is_err());
    }
}
