//! vCloud 平台错误定义

use thiserror::Error;

/// vCloud 平台错误类型
#[derive(Error, Debug)]
pub enum VcloudError {
    #[error("HTTP 错误: {0}")]
    HttpError(String),

    #[error("认证错误: {0}")]
    AuthError(String),

    #[error("API 错误 [{0}]: {1}")]
    ApiError(u16, String),

    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("参数错误: {0}")]
    InvalidInput(String),

    #[error("模板没有可部署的虚拟机: {0}")]
    TemplateNoVm(String),

    #[error("任务执行失败: {0}")]
    TaskFailed(String),

    #[error("响应格式异常: {0}")]
    MalformedResponse(String),

    #[error("超时错误: {0}")]
    Timeout(String),

    #[error("资源不存在: {0}")]
    NotFound(String),
}

/// vCloud 平台结果类型
pub type Result<T> = std::result::Result<T, VcloudError>;
