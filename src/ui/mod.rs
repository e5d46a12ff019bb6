mod progress;

use std::fmt;
use std::path::PathBuf;

pub use progress::ProgressManager;

use crate::core::task::state::TaskDetail;

pub fn print_success(message: &str) {
    println!("✓ {}", message);
}

pub fn print_error(message: &str) {
    eprintln!("✗ {}", message);
}

/// 统一的大小展示格式，保留两位小数
pub fn format_mb(size_mb: f64) -> String {
    format!("{:.2} MB", size_mb)
}

/// 压缩完成后的结果摘要
pub struct CompressionSummary {
    pub original_mb: f64,
    pub target_mb: f64,
    pub compressed_mb: Option<f64>,
    pub elapsed_secs: Option<f64>,
    pub saved_path: Option<PathBuf>,
}

impl CompressionSummary {
    pub fn from_detail(detail: &TaskDetail, saved_path: Option<PathBuf>) -> Self {
        Self {
            original_mb: detail.original_size_mb,
            target_mb: detail.target_size_mb,
            compressed_mb: detail.compressed_size_mb,
            elapsed_secs: detail.elapsed().map(|d| d.num_milliseconds() as f64 / 1000.0),
            saved_path,
        }
    }
}

impl fmt::Display for CompressionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n压缩摘要:")?;
        writeln!(f, "  原始大小: {}", format_mb(self.original_mb))?;
        writeln!(f, "  目标大小: {}", format_mb(self.target_mb))?;
        if let Some(compressed) = self.compressed_mb {
            writeln!(f, "  压缩后大小: {}", format_mb(compressed))?;
            if self.original_mb > 0.0 {
                writeln!(f, "  压缩率: {:.1}%", compressed / self.original_mb * 100.0)?;
            }
        }
        if let Some(secs) = self.elapsed_secs {
            writeln!(f, "  用时: {:.1} 秒", secs)?;
        }
        if let Some(path) = &self.saved_path {
            writeln!(f, "  保存位置: {}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mb() {
        assert_eq!(format_mb(10.0), "10.00 MB");
        assert_eq!(format_mb(1.8), "1.80 MB");
        assert_eq!(format_mb(0.125), "0.13 MB");
    }

    #[test]
    fn test_summary_display() {
        let summary = CompressionSummary {
            original_mb: 10.0,
            target_mb: 2.0,
            compressed_mb: Some(1.8),
            elapsed_secs: Some(42.5),
            saved_path: Some(PathBuf::from("./downloads/compressed_report.pdf")),
        };
        let text = summary.to_string();
        assert!(text.contains("原始大小: 10.00 MB"));
        assert!(text.contains("压缩后大小: 1.80 MB"));
        assert!(text.contains("压缩率: 18.0%"));
        assert!(text.contains("用时: 42.5 秒"));
        assert!(text.contains("compressed_report.pdf"));
    }

    #[test]
    fn test_summary_without_result() {
        let summary = CompressionSummary {
            original_mb: 10.0,
            target_mb: 2.0,
            compressed_mb: None,
            elapsed_secs: None,
            saved_path: None,
        };
        let text = summary.to_string();
        assert!(text.contains("目标大小: 2.00 MB"));
        assert!(!text.contains("压缩后大小"));
        assert!(!text.contains("用时"));
    }
}
