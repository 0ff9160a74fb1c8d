//! AT&T Synaptic (vCloud 1.5) 计算平台客户端
//!
//! 提供与 vCloud 1.5 变体 API 交互的客户端实现：
//! 以 XML-over-HTTP 协议从模板组合 vApp，配置 CPU/内存并开机，
//! 异步任务通过轮询 Task href 跟踪至终止状态。
//!
//! # 功能
//!
//! - **vApp 管理** (`VAppApi`): 从模板组合创建、开机、修改 CPU/内存、按名称定位
//! - **模板管理** (`TemplateApi`): 模板详情查询、解析模板内虚拟机
//! - **数据中心/网络** (`VdcApi` / `NetworkApi`): 组织资源枚举，固定首选部署策略
//! - **异步任务** (`TaskApi`): Task 轮询，默认 14400 秒上限
//!
//! # 示例
//!
//! ```ignore
//! use synaptic_vcloud::{VcloudClient, VcloudConfig, CreateVAppRequest};
//!
//! let mut client = VcloudClient::new("https://vcloud.example.com/api", VcloudConfig::default())?;
//! client.login("admin@org", "password").await?;
//!
//! let req = CreateVAppRequest::new("box1", "https://vcloud.example.com/api/vAppTemplate/1")
//!     .with_vm_names(vec!["box1".into()])
//!     .with_cpu(2)
//!     .with_memory(2048);
//! let vapp = client.vapp().create(req).await?;
//! println!("vApp 已创建: {} ({})", vapp.name, vapp.href);
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod validate;
pub mod xml;

pub use client::{VcloudClient, VcloudConfig};
pub use error::{Result, VcloudError};

// 导出 API 模块
pub use api::{NetworkApi, TaskApi, TemplateApi, VAppApi, VdcApi};

// 导出数据模型
pub use models::{
    CreateVAppRequest, OrgNetwork, Task, TaskStatus, VApp, VAppStatus, VAppTemplate, Vdc,
};

// 导出 XML 构造器
pub use xml::{ComposeVAppXml, XmlElement};
