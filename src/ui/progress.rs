use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::task::view::TaskView;

/// 进度界面：把 TaskView 映射到终端上的一个旋转指示条
///
/// queued / running 显示不确定进度（任务耗时由服务端决定，
/// 客户端拿不到百分比），终态时收尾为一行结果。
pub struct ProgressManager {
    bar: ProgressBar,
    last_message: String,
}

impl ProgressManager {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        ProgressManager {
            bar,
            last_message: String::new(),
        }
    }

    /// 根据当前视图刷新显示，内容不变时不重绘
    pub fn render(&mut self, view: &TaskView) {
        let message = match view.detail_line() {
            Some(line) => format!("{} ({})", view.headline(), line),
            None => view.headline(),
        };
        if message != self.last_message {
            self.bar.set_message(message.clone());
            self.last_message = message;
        }
    }

    /// 终态收尾，保留最后一行
    pub fn finish(&self, view: &TaskView) {
        self.bar.finish_with_message(view.headline());
    }

    /// 取消时清掉指示条
    pub fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}
