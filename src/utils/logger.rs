use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use actix::prelude::*;
use chrono::Local;
use log::LevelFilter;

/// 日志消息
pub struct LogMsg {
    pub level: LevelFilter,
    pub message: String,
}
impl Message for LogMsg { type Result = (); }

/// 文件日志 Actor
///
/// 单写者，顺序写入，超过 max_size 时轮转到 *.old。
pub struct LoggerActor {
    writer: BufWriter<File>,
    level: LevelFilter,
    file_path: String,
    max_size: u64,
    current_size: u64,
}

impl LoggerActor {
    pub fn new(file_path: &str, level: LevelFilter, max_size: u64) -> Result<Self, std::io::Error> {
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(file_path)?;
        let current_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            writer: BufWriter::new(file),
            level,
            file_path: file_path.to_string(),
            max_size,
            current_size,
        })
    }

    fn rotate_if_needed(&mut self) -> Result<(), std::io::Error> {
        if self.current_size <= self.max_size {
            return Ok(());
        }
        self.writer.flush()?;
        let old_path = format!("{}.old", self.file_path);
        if Path::new(&old_path).exists() {
            std::fs::remove_file(&old_path)?;
        }
        std::fs::rename(&self.file_path, &old_path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        self.writer = BufWriter::new(file);
        self.current_size = 0;
        Ok(())
    }

    fn write_log(&mut self, level: LevelFilter, message: &str) -> Result<(), std::io::Error> {
        if level > self.level {
            return Ok(());
        }
        self.rotate_if_needed()?;
        let line = format!(
            "{} [{}] {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            level,
            message
        );
        self.writer.write_all(line.as_bytes())?;
        self.current_size += line.len() as u64;
        // 错误立即落盘，其余交给缓冲
        if level <= LevelFilter::Warn {
            self.writer.flush()?;
        }
        Ok(())
    }
}

impl Actor for LoggerActor {
    type Context = Context<Self>;

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let _ = self.writer.flush();
    }
}

impl Handler<LogMsg> for LoggerActor {
    type Result = ();
    fn handle(&mut self, msg: LogMsg, _ctx: &mut Self::Context) {
        if let Err(e) = self.write_log(msg.level, &msg.message) {
            eprintln!("日志写入失败: {}", e);
        }
    }
}

/// 便捷的日志方法 - 为 Addr<LoggerActor> 提供扩展方法
pub trait LoggerExt {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
}

impl LoggerExt for Addr<LoggerActor> {
    fn info(&self, message: &str) {
        self.do_send(LogMsg { level: LevelFilter::Info, message: message.to_string() });
    }

    fn error(&self, message: &str) {
        self.do_send(LogMsg { level: LevelFilter::Error, message: message.to_string() });
    }

    fn warn(&self, message: &str) {
        self.do_send(LogMsg { level: LevelFilter::Warn, message: message.to_string() });
    }
}
