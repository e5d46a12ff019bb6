use std::rc::Rc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use anyhow::Context;
use crossterm::{
    cursor, execute, terminal,
    event::{self, Event, KeyCode},
};
use log::LevelFilter;

use pdfsquash::cli::{self, RunMode};
use pdfsquash::config::Config;
use pdfsquash::core::client::{ApiClient, CompressionApi, SubmitOptions};
use pdfsquash::core::error::{CompressError, CompressResult};
use pdfsquash::core::task::poller::{CancelPolling, QueryView, StartPolling, TaskPollerActor};
use pdfsquash::core::task::state::TaskStatus;
use pdfsquash::core::task::view::TaskView;
use pdfsquash::ui::{self, CompressionSummary, ProgressManager};
use pdfsquash::utils::logger::{LoggerActor, LoggerExt};

const UI_REFRESH_INTERVAL: Duration = Duration::from_millis(200);
const KEYBOARD_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[actix::main]
async fn main() -> anyhow::Result<()> {
    let logger = LoggerActor::new("logs/pdfsquash.log", LevelFilter::Info, 5 * 1024 * 1024)
        .context("日志初始化失败")?
        .start();
    logger.info("客户端启动");

    // 解析参数和配置
    let (args, config) = match cli::Args::parse_args() {
        Ok((args, config)) => (args, config),
        Err(e) => {
            logger.error(&format!("参数解析失败: {}", e));
            eprintln!("参数解析失败: {}", e);
            std::process::exit(1);
        }
    };

    let mode = match args.run_mode() {
        Ok(mode) => mode,
        Err(e) => {
            logger.error(&format!("参数错误: {}", e));
            ui::print_error(&e.to_string());
            std::process::exit(1);
        }
    };

    logger.info(&format!("配置文件路径: {}", args.config));
    logger.info(&config.get_summary());

    let client = match ApiClient::new(&config) {
        Ok(client) => Rc::new(client),
        Err(e) => {
            logger.error(&format!("客户端初始化失败: {}", e));
            ui::print_error(&e.to_string());
            std::process::exit(1);
        }
    };

    let outcome = match mode {
        RunMode::Compress { pdf, target_size_mb } => {
            run_compress_stage(client, pdf, target_size_mb, &config, &logger).await
        }
        RunMode::Watch { task_id } => {
            run_progress_stage(client, task_id, &config, &logger).await
        }
        RunMode::Result { task_id } => {
            run_result_stage(&client, &task_id, &config, &logger).await
        }
    };

    if let Err(e) = outcome {
        logger.error(&format!("运行失败: {}", e));
        ui::print_error(&e.to_string());
        std::process::exit(if e.is_fatal() { 2 } else { 1 });
    }

    logger.info("客户端退出");
    Ok(())
}

/// 提交阶段：上传文件，拿到任务ID后进入进度阶段
async fn run_compress_stage(
    client: Rc<ApiClient>,
    pdf: String,
    target_size_mb: f64,
    config: &Config,
    logger: &Addr<LoggerActor>,
) -> CompressResult<()> {
    let opts = SubmitOptions::from_config(config, target_size_mb);
    logger.info(&format!("提交压缩任务: {} -> {} MB", pdf, target_size_mb));

    let receipt = client.submit(&pdf, &opts).await?;
    logger.info(&format!("任务已创建: {}", receipt.task_id));
    ui::print_success(&format!(
        "任务已创建: {} (初始状态: {})",
        receipt.task_id, receipt.status
    ));

    run_progress_stage(client, receipt.task_id, config, logger).await
}

/// 进度阶段：轮询任务状态并实时渲染，按 'q' 取消
async fn run_progress_stage(
    client: Rc<ApiClient>,
    task_id: String,
    config: &Config,
    logger: &Addr<LoggerActor>,
) -> CompressResult<()> {
    logger.info(&format!("开始轮询任务 {}", task_id));

    let poller =
        TaskPollerActor::from_config(client.clone() as Rc<dyn CompressionApi>, task_id.clone(), config)
            .start();
    poller.do_send(StartPolling);

    println!("跟踪任务 {} (按 'q' 取消轮询并退出)", task_id);

    // 非交互环境下跳过键盘处理
    let raw_mode = terminal::enable_raw_mode().is_ok();
    if raw_mode {
        execute!(std::io::stdout(), cursor::Hide).ok();
    }

    let mut progress = ProgressManager::new();
    let mut last_refresh = Instant::now() - UI_REFRESH_INTERVAL;
    let mut cancelled = false;
    let mut final_view = TaskView::Loading;
    let mut redirect: Option<String> = None;

    loop {
        // 处理键盘输入
        if raw_mode {
            if let Ok(true) = event::poll(KEYBOARD_POLL_INTERVAL) {
                if let Ok(Event::Key(key_event)) = event::read() {
                    if matches!(key_event.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
                        poller.do_send(CancelPolling);
                        cancelled = true;
                        logger.info("用户取消轮询");
                        break;
                    }
                }
            }
        }

        // 刷新进度显示
        if last_refresh.elapsed() >= UI_REFRESH_INTERVAL {
            let snap = poller
                .send(QueryView)
                .await
                .map_err(|e| CompressError::unknown(format!("轮询器无响应: {}", e)))?;
            progress.render(&snap.view);
            final_view = snap.view;

            if snap.redirect.is_some() {
                redirect = snap.redirect;
                break;
            }
            if !snap.polling {
                break;
            }
            last_refresh = Instant::now();
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // 恢复终端
    if raw_mode {
        execute!(std::io::stdout(), cursor::Show).ok();
        terminal::disable_raw_mode().ok();
    }

    if cancelled {
        progress.abandon();
        println!(
            "已取消轮询。任务仍在服务端继续执行，可用 --watch {} 重新进入。",
            task_id
        );
        return Ok(());
    }

    progress.finish(&final_view);

    match final_view {
        TaskView::FetchError(msg) => {
            logger.error(&format!("任务 {} 查询失败: {}", task_id, msg));
            ui::print_error(&msg);
            println!("任务仍可能在服务端执行，可用 --watch {} 重新进入。", task_id);
            std::process::exit(1);
        }
        TaskView::Failed { message, .. } => {
            logger.error(&format!("任务 {} 压缩失败: {}", task_id, message));
            ui::print_error(&format!("压缩失败: {}", message));
            std::process::exit(1);
        }
        _ => {}
    }

    // 完成：交棒给结果阶段，只带任务ID，结果阶段重新查询
    if let Some(task_id) = redirect {
        logger.info(&format!("任务 {} 完成，进入结果阶段", task_id));
        return run_result_stage(&client, &task_id, config, logger).await;
    }
    Ok(())
}

/// 结果阶段：重新查询一次状态，下载压缩结果并打印摘要
async fn run_result_stage(
    client: &ApiClient,
    task_id: &str,
    config: &Config,
    logger: &Addr<LoggerActor>,
) -> CompressResult<()> {
    // 不用进度阶段的缓存数据，总是取最新状态
    let detail = client.fetch_status(task_id).await?;

    let url = match (detail.status, &detail.result_download_url) {
        (TaskStatus::Completed, Some(url)) => url.clone(),
        (TaskStatus::Failed, _) => {
            let message = detail
                .error_message
                .clone()
                .unwrap_or_else(|| "未知原因".to_string());
            logger.error(&format!("任务 {} 压缩失败: {}", task_id, message));
            ui::print_error(&format!("压缩失败: {}", message));
            std::process::exit(1);
        }
        _ => {
            println!("压缩仍在进行中，请稍后用 --result {} 再试。", task_id);
            return Ok(());
        }
    };

    let fallback_name = format!("compressed_{}", detail.original_filename);
    logger.info(&format!("下载压缩结果: {}", url));
    let (path, bytes) = client
        .download_result(&url, &config.download_dir, &fallback_name)
        .await?;
    logger.info(&format!("已保存 {} ({} 字节)", path.display(), bytes));

    let summary = CompressionSummary::from_detail(&detail, Some(path));
    println!("{}", summary);
    ui::print_success("下载完成");
    Ok(())
}
