use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;

use crate::config::Config;
use crate::core::client::CompressionApi;
use crate::core::error::CompressError;
use crate::core::task::state::{TaskDetail, TaskStatus};
use crate::core::task::view::TaskView;

/// 开始轮询（立即发出第一次查询）
pub struct StartPolling;
impl Message for StartPolling { type Result = (); }

/// 内部消息：查询结果已返回
struct StatusFetched {
    result: Result<TaskDetail, CompressError>,
}
impl Message for StatusFetched { type Result = (); }

/// 停止轮询，丢弃在途响应，取消未触发的定时器
pub struct CancelPolling;
impl Message for CancelPolling { type Result = (); }

/// 查询当前视图快照
pub struct QueryView;
impl Message for QueryView { type Result = PollSnapshot; }

/// 轮询器对外的快照
#[derive(Debug, Clone)]
pub struct PollSnapshot {
    pub view: TaskView,
    /// 还有查询在途或已排定（取消后恒为 false）
    pub polling: bool,
    /// 完成延迟到期后携带任务ID，表示可以进入结果阶段
    pub redirect: Option<String>,
}

/// 单任务轮询 Actor
///
/// 同一任务同时最多一个查询在途：下一次查询在上一次返回之后
/// 经 run_later 排定，定时器句柄只有一个。取消通过显式的
/// AtomicBool 令牌，迟到的响应在两处被丢弃（在途 future 和
/// 结果处理器），不会在取消后再改状态。
pub struct TaskPollerActor {
    task_id: String,
    api: Rc<dyn CompressionApi>,
    interval: Duration,
    redirect_delay: Duration,
    last: Option<TaskDetail>,
    fetch_error: Option<String>,
    cancelled: Arc<AtomicBool>,
    pending: Option<SpawnHandle>,
    in_flight: bool,
    redirect: Option<String>,
}

impl Actor for TaskPollerActor {
    type Context = Context<Self>;
}

impl TaskPollerActor {
    pub fn new(
        api: Rc<dyn CompressionApi>,
        task_id: String,
        interval: Duration,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            task_id,
            api,
            interval,
            redirect_delay,
            last: None,
            fetch_error: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            pending: None,
            in_flight: false,
            redirect: None,
        }
    }

    pub fn from_config(api: Rc<dyn CompressionApi>, task_id: String, config: &Config) -> Self {
        Self::new(
            api,
            task_id,
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_millis(config.redirect_delay_ms),
        )
    }

    fn begin_fetch(&mut self, ctx: &mut Context<Self>) {
        if self.cancelled.load(Ordering::SeqCst) {
            return;
        }
        self.in_flight = true;

        let api = self.api.clone();
        let task_id = self.task_id.clone();
        let cancelled = self.cancelled.clone();
        let addr = ctx.address();
        actix::spawn(async move {
            let result = api.fetch_status(&task_id).await;
            // 取消后丢弃迟到的响应
            if cancelled.load(Ordering::SeqCst) {
                return;
            }
            addr.do_send(StatusFetched { result });
        });
    }
}

impl Handler<StartPolling> for TaskPollerActor {
    type Result = ();
    fn handle(&mut self, _msg: StartPolling, ctx: &mut Self::Context) {
        // 重复的 StartPolling 不会产生并行查询
        if self.in_flight || self.pending.is_some() || self.last.is_some() {
            return;
        }
        self.begin_fetch(ctx);
    }
}

impl Handler<StatusFetched> for TaskPollerActor {
    type Result = ();
    fn handle(&mut self, msg: StatusFetched, ctx: &mut Self::Context) {
        self.in_flight = false;
        if self.cancelled.load(Ordering::SeqCst) {
            return;
        }
        match msg.result {
            Ok(detail) => {
                let status = detail.status;
                self.fetch_error = None;
                self.last = Some(detail);
                match status {
                    TaskStatus::Completed => {
                        // 终态。延迟一拍后交棒给结果阶段，只传任务ID，
                        // 结果阶段自己重新查询。
                        self.pending = Some(ctx.run_later(self.redirect_delay, |act, _ctx| {
                            act.pending = None;
                            if !act.cancelled.load(Ordering::SeqCst) {
                                act.redirect = Some(act.task_id.clone());
                            }
                        }));
                    }
                    TaskStatus::Failed => {
                        // 终态，不再排定查询
                    }
                    _ => {
                        // 间隔从本次返回起计，保证同一任务不会有并行查询
                        self.pending = Some(ctx.run_later(self.interval, |act, ctx| {
                            act.pending = None;
                            act.begin_fetch(ctx);
                        }));
                    }
                }
            }
            Err(e) => {
                // 查询失败不等于任务失败：任务在服务端照常执行。
                // 这里停止轮询并展示错误，重新进入需要 --watch。
                log::warn!("任务 {} 状态查询失败: {}", self.task_id, e);
                self.fetch_error = Some(e.to_string());
            }
        }
    }
}

impl Handler<CancelPolling> for TaskPollerActor {
    type Result = ();
    fn handle(&mut self, _msg: CancelPolling, ctx: &mut Self::Context) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.pending.take() {
            ctx.cancel_future(handle);
        }
    }
}

impl Handler<QueryView> for TaskPollerActor {
    type Result = MessageResult<QueryView>;
    fn handle(&mut self, _msg: QueryView, _ctx: &mut Self::Context) -> Self::Result {
        let polling = !self.cancelled.load(Ordering::SeqCst)
            && (self.in_flight || self.pending.is_some());
        MessageResult(PollSnapshot {
            view: TaskView::project(self.fetch_error.as_deref(), self.last.as_ref()),
            polling,
            redirect: self.redirect.clone(),
        })
    }
}
