//! vCloud 平台数据模型
//!
//! 响应中的实体在进入本层时即解析为带类型的记录，
//! 任务状态同样在解析时一次性转为显式枚举，调用方不再接触原始 XML 形态。

use serde::{Deserialize, Serialize};

use crate::error::{Result, VcloudError};
use crate::xml::XmlElement;

/// 组织网络描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgNetwork {
    /// 网络名称
    pub name: String,

    /// 网络 href
    pub href: String,
}

/// 虚拟数据中心
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vdc {
    /// 数据中心名称
    pub name: String,

    /// 数据中心 href
    pub href: String,
}

/// vApp 模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VAppTemplate {
    /// 模板显示名称
    pub name: String,

    /// 模板 href
    pub href: String,
}

/// vApp 状态
///
/// 对应 vCloud 实体 `status` 属性的数值编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VAppStatus {
    /// 未解析 (0)
    Unresolved,

    /// 已解析 (1)
    Resolved,

    /// 已挂起 (3)
    Suspended,

    /// 已开机 (4)
    PoweredOn,

    /// 已关机 (8)
    PoweredOff,

    /// 其他编码
    Unknown(i32),
}

impl VAppStatus {
    /// 从数值编码解析状态
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => VAppStatus::Unresolved,
            1 => VAppStatus::Resolved,
            3 => VAppStatus::Suspended,
            4 => VAppStatus::PoweredOn,
            8 => VAppStatus::PoweredOff,
            other => VAppStatus::Unknown(other),
        }
    }

    /// 状态对应的数值编码
    pub fn code(&self) -> i32 {
        match self {
            VAppStatus::Unresolved => 0,
            VAppStatus::Resolved => 1,
            VAppStatus::Suspended => 3,
            VAppStatus::PoweredOn => 4,
            VAppStatus::PoweredOff => 8,
            VAppStatus::Unknown(code) => *code,
        }
    }
}

/// vApp 实例
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VApp {
    /// vApp 名称
    pub name: String,

    /// vApp href
    pub href: String,

    /// 当前状态
    pub status: VAppStatus,
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// 已排队
    Queued,

    /// 准备执行
    PreRunning,

    /// 执行中
    Running,

    /// 执行成功
    Success,

    /// 执行失败
    Error,

    /// 已取消
    Canceled,

    /// 已中止
    Aborted,
}

impl TaskStatus {
    /// 从 `status` 属性值解析状态
    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(TaskStatus::Queued),
            "preRunning" => Some(TaskStatus::PreRunning),
            "running" => Some(TaskStatus::Running),
            "success" => Some(TaskStatus::Success),
            "error" => Some(TaskStatus::Error),
            "canceled" => Some(TaskStatus::Canceled),
            "aborted" => Some(TaskStatus::Aborted),
            _ => None,
        }
    }

    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Error | TaskStatus::Canceled | TaskStatus::Aborted
        )
    }
}

/// 异步任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// 任务 href（轮询地址）
    pub href: String,

    /// 任务状态
    pub status: TaskStatus,

    /// 操作描述
    pub operation: Option<String>,

    /// 失败时的错误消息
    pub error_message: Option<String>,
}

impl Task {
    /// 从响应中的 Task 元素解析任务
    ///
    /// 缺少 `href` 的任务元素视为提交即失败：若带 Error 子元素则携带
    /// 平台错误消息返回 `TaskFailed`，否则返回 `MalformedResponse`。
    pub fn from_element(element: &XmlElement) -> Result<Task> {
        let error_message = element
            .find("Error")
            .and_then(|e| e.attr("message"))
            .map(str::to_string);

        let href = match element.attr("href") {
            Some(href) => href.to_string(),
            None => {
                return match error_message {
                    Some(message) => Err(VcloudError::TaskFailed(message)),
                    None => Err(VcloudError::MalformedResponse(
                        "任务元素既没有 href 也没有 Error 子元素".to_string(),
                    )),
                }
            }
        };

        // 缺失或未知的 status 按排队处理，交给轮询继续观察
        let status = element
            .attr("status")
            .and_then(TaskStatus::from_status)
            .unwrap_or(TaskStatus::Queued);
        let operation = element.attr("operation").map(str::to_string);

        Ok(Task {
            href,
            status,
            operation,
            error_message,
        })
    }
}

/// 创建 vApp 请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateVAppRequest {
    /// vApp 名称（同时作为来宾计算机名）
    pub name: String,

    /// 源模板 href
    pub template_href: String,

    /// 虚拟机名称列表（最长 15 字符，需符合主机名规则）
    pub vm_names: Option<Vec<String>>,

    /// 每台虚拟机的 CPU 核心数
    pub cpu: Option<u32>,

    /// 每台虚拟机的内存大小 (MB)
    pub memory: Option<u64>,

    /// 创建完成后是否开机
    pub deploy: bool,
}

impl CreateVAppRequest {
    /// 创建请求，默认创建后开机
    pub fn new(name: impl Into<String>, template_href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template_href: template_href.into(),
            vm_names: None,
            cpu: None,
            memory: None,
            deploy: true,
        }
    }

    /// 设置虚拟机名称列表
    pub fn with_vm_names(mut self, vm_names: Vec<String>) -> Self {
        self.vm_names = Some(vm_names);
        self
    }

    /// 设置 CPU 核心数
    pub fn with_cpu(mut self, cpu: u32) -> Self {
        self.cpu = Some(cpu);
        self
    }

    /// 设置内存大小 (MB)
    pub fn with_memory(mut self, memory: u64) -> Self {
        self.memory = Some(memory);
        self
    }

    /// 设置创建后是否开机
    pub fn with_deploy(mut self, deploy: bool) -> Self {
        self.deploy = deploy;
        self
    }
}
