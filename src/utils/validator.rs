use std::path::Path;

use url::Url;

use crate::core::error::{CompressError, CompressResult};

/// 目标大小必须为正数，提交前在本地校验，不消耗网络请求
pub fn validate_target_size_mb(target_size_mb: f64) -> CompressResult<()> {
    if !target_size_mb.is_finite() || target_size_mb <= 0.0 {
        return Err(CompressError::validation("目标大小必须大于 0"));
    }
    Ok(())
}

/// 校验待压缩的 PDF 文件路径
pub fn validate_pdf_path(path: &str) -> CompressResult<()> {
    if path.trim().is_empty() {
        return Err(CompressError::validation("请先选择一个 PDF 文件"));
    }
    let p = Path::new(path);
    if !p.exists() {
        return Err(CompressError::validation(format!("文件不存在: {}", path)));
    }
    if !p.is_file() {
        return Err(CompressError::validation(format!("不是文件: {}", path)));
    }
    let is_pdf = p
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(CompressError::validation(format!(
            "只支持 PDF 文件: {}",
            path
        )));
    }
    Ok(())
}

/// 校验任务ID非空
pub fn validate_task_id(task_id: &str) -> CompressResult<()> {
    if task_id.trim().is_empty() {
        return Err(CompressError::validation("任务ID不能为空"));
    }
    Ok(())
}

pub fn is_valid_api_base(api_base: &str) -> bool {
    match Url::parse(api_base) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_size_validation() {
        assert!(validate_target_size_mb(2.0).is_ok());
        assert!(validate_target_size_mb(0.1).is_ok());
        assert!(validate_target_size_mb(0.0).is_err());
        assert!(validate_target_size_mb(-1.0).is_err());
        assert!(validate_target_size_mb(f64::NAN).is_err());
        assert!(validate_target_size_mb(f64::INFINITY).is_err());
    }

    #[test]
    fn test_pdf_path_validation() {
        assert!(validate_pdf_path("").is_err());
        assert!(validate_pdf_path("./nonexistent.pdf").is_err());

        // 存在但扩展名不对
        let dir = std::env::temp_dir().join("pdfsquash_validator_test");
        std::fs::create_dir_all(&dir).unwrap();
        let txt = dir.join("note.txt");
        std::fs::write(&txt, b"hello").unwrap();
        assert!(validate_pdf_path(txt.to_str().unwrap()).is_err());

        let pdf = dir.join("doc.PDF");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();
        assert!(validate_pdf_path(pdf.to_str().unwrap()).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_task_id_validation() {
        assert!(validate_task_id("abc123").is_ok());
        assert!(validate_task_id("").is_err());
        assert!(validate_task_id("   ").is_err());
    }

    #[test]
    fn test_api_base_validation() {
        assert!(is_valid_api_base("http://127.0.0.1:8000/api"));
        assert!(is_valid_api_base("https://pdf.example.com/api"));
        assert!(!is_valid_api_base("ftp://example.com"));
        assert!(!is_valid_api_base("not-a-url"));
        assert!(!is_valid_api_base(""));
    }
}
