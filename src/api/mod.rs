//! vCloud 平台 API 模块
//!
//! 提供按资源划分的 API 封装，包括：
//! - vApp 管理 (VAppApi)
//! - 模板管理 (TemplateApi)
//! - 虚拟数据中心 (VdcApi)
//! - 组织网络 (NetworkApi)
//! - 异步任务 (TaskApi)

pub mod network;
pub mod task;
pub mod template;
pub mod vapp;
pub mod vdc;

pub use network::NetworkApi;
pub use task::TaskApi;
pub use template::TemplateApi;
pub use vapp::VAppApi;
pub use vdc::VdcApi;
