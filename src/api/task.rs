//! 异步任务 API
//!
//! vCloud 的长操作统一返回 Task，调用方拿到 href 后在此轮询直至终止状态。

use std::time::Instant;

use reqwest::Method;
use tracing::{debug, info, warn};

use crate::client::VcloudClient;
use crate::error::{Result, VcloudError};
use crate::models::{Task, TaskStatus};

/// 异步任务 API
pub struct TaskApi<'a> {
    client: &'a VcloudClient,
}

impl<'a> TaskApi<'a> {
    /// 创建新的任务 API 实例
    pub(crate) fn new(client: &'a VcloudClient) -> Self {
        Self { client }
    }

    /// 查询一次任务状态
    pub async fn get(&self, task_href: &str) -> Result<Task> {
        debug!("查询任务状态: {}", task_href);
        let element = self
            .client
            .request(Method::GET, task_href, None, None)
            .await?;
        Task::from_element(&element)
    }

    /// 等待任务完成（使用配置中的默认超时上限）
    pub async fn wait(&self, task_href: &str) -> Result<Task> {
        let timeout = self.client.config().task_timeout;
        self.wait_for_completion(task_href, timeout).await
    }

    /// 等待任务完成
    ///
    /// 按配置的间隔轮询任务 href，直到：
    /// - `success`: 返回任务
    /// - `error` / `canceled` / `aborted`: 返回 `TaskFailed`，携带平台错误消息
    /// - 超过 `timeout_secs`: 返回 `Timeout`
    pub async fn wait_for_completion(&self, task_href: &str, timeout_secs: u64) -> Result<Task> {
        let interval = self.client.config().poll_interval;
        info!(
            "等待任务完成: {} (上限 {}s, 间隔 {}s)",
            task_href, timeout_secs, interval
        );

        let started = Instant::now();
        loop {
            let task = self.get(task_href).await?;

            match task.status {
                TaskStatus::Success => {
                    info!("任务完成: {}", task_href);
                    return Ok(task);
                }
                TaskStatus::Error | TaskStatus::Canceled | TaskStatus::Aborted => {
                    let status = task.status;
                    let message = task
                        .error_message
                        .unwrap_or_else(|| format!("任务进入 {:?} 状态", status));
                    warn!("任务失败: {} - {}", task_href, message);
                    return Err(VcloudError::TaskFailed(message));
                }
                TaskStatus::Queued | TaskStatus::PreRunning | TaskStatus::Running => {}
            }

            if started.elapsed().as_secs() >= timeout_secs {
                warn!("任务超时: {} ({}s)", task_href, timeout_secs);
                return Err(VcloudError::Timeout(format!(
                    "任务 {} 在 {} 秒内未完成",
                    task_href, timeout_secs
                )));
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(interval)).await;
        }
    }
}
