//! vCloud 平台客户端核心实现

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, Method};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{NetworkApi, TaskApi, TemplateApi, VAppApi, VdcApi};
use crate::error::{Result, VcloudError};
use crate::xml::XmlElement;

/// vCloud 1.5 版本协商头
const ACCEPT_HEADER: &str = "application/*+xml;version=1.5";

/// 会话令牌头
const AUTH_HEADER: &str = "x-vcloud-authorization";

/// 组织链接的媒体类型
const ORG_TYPE: &str = "application/vnd.vmware.vcloud.org+xml";

/// vCloud 平台客户端配置
#[derive(Debug, Clone)]
pub struct VcloudConfig {
    /// 连接超时（秒）
    pub connect_timeout: u64,

    /// 请求超时（秒）
    pub request_timeout: u64,

    /// 是否验证 SSL 证书
    pub verify_ssl: bool,

    /// 异步任务完成上限（秒）
    pub task_timeout: u64,

    /// 任务轮询间隔（秒）
    pub poll_interval: u64,
}

impl Default for VcloudConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10,
            request_timeout: 60,
            verify_ssl: true,
            task_timeout: 14400,
            poll_interval: 5,
        }
    }
}

/// vCloud 平台客户端
///
/// 一个实例对应一个会话，内部不做并发协调；
/// 需要并发创建 vApp 时应各自持有独立实例。
pub struct VcloudClient {
    /// API 基础 URL
    base_url: String,

    /// HTTP 客户端
    http_client: Client,

    /// 会话令牌
    auth_token: Arc<RwLock<Option<String>>>,

    /// 登录组织的 href
    org_href: Arc<RwLock<Option<String>>>,

    /// 配置
    config: VcloudConfig,
}

impl VcloudClient {
    /// 创建新的 vCloud 客户端
    pub fn new(base_url: &str, config: VcloudConfig) -> Result<Self> {
        Url::parse(base_url)
            .map_err(|e| VcloudError::ConfigError(format!("无效的 API 地址 {}: {}", base_url, e)))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| VcloudError::HttpError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            auth_token: Arc::new(RwLock::new(None)),
            org_href: Arc::new(RwLock::new(None)),
            config,
        })
    }

    /// 认证登录
    ///
    /// vCloud 1.5 会话协议：POST `{base}/sessions`，凭据走 HTTP Basic，
    /// 会话令牌从 `x-vcloud-authorization` 响应头取得，
    /// 组织 href 从会话体的 Link 元素取得。
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        info!("vCloud 客户端登录: {}", username);

        let credentials = BASE64.encode(format!("{}:{}", username, password));
        let login_url = format!("{}/sessions", self.base_url);

        let response = self
            .http_client
            .post(&login_url)
            .header("Authorization", format!("Basic {}", credentials))
            .header("Accept", ACCEPT_HEADER)
            .send()
            .await
            .map_err(|e| VcloudError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VcloudError::AuthError(format!(
                "vCloud 登录失败: HTTP {}",
                status
            )));
        }

        let token = response
            .headers()
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| VcloudError::AuthError("未获取到会话令牌".to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| VcloudError::ParseError(e.to_string()))?;
        let session = XmlElement::parse(&body)?;

        // 会话下挂多个组织时取第一个
        let org_href = session
            .find_all("Link")
            .into_iter()
            .find(|link| link.attr("type") == Some(ORG_TYPE))
            .and_then(|link| link.attr("href"))
            .map(str::to_string)
            .ok_or_else(|| {
                VcloudError::MalformedResponse("会话响应缺少组织链接".to_string())
            })?;

        *self.auth_token.write().await = Some(token);
        *self.org_href.write().await = Some(org_href);

        info!("vCloud 客户端登录成功");
        Ok(())
    }

    /// 注销登出
    pub async fn logout(&mut self) -> Result<()> {
        info!("vCloud 客户端登出");
        *self.auth_token.write().await = None;
        *self.org_href.write().await = None;
        Ok(())
    }

    /// 获取 vApp 管理 API
    pub fn vapp(&self) -> VAppApi<'_> {
        VAppApi::new(self)
    }

    /// 获取模板管理 API
    pub fn template(&self) -> TemplateApi<'_> {
        TemplateApi::new(self)
    }

    /// 获取虚拟数据中心 API
    pub fn vdc(&self) -> VdcApi<'_> {
        VdcApi::new(self)
    }

    /// 获取组织网络 API
    pub fn network(&self) -> NetworkApi<'_> {
        NetworkApi::new(self)
    }

    /// 获取异步任务 API
    pub fn task(&self) -> TaskApi<'_> {
        TaskApi::new(self)
    }

    /// 发送 HTTP 请求并解析 XML 响应
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        content_type: Option<&str>,
    ) -> Result<XmlElement> {
        let url = self.resolve_url(url);
        debug!("vCloud API 请求: {} {}", method, url);

        let token = self.auth_token.read().await;
        let token_str = token
            .as_ref()
            .ok_or_else(|| VcloudError::AuthError("未认证，请先登录".to_string()))?;

        let mut request = self
            .http_client
            .request(method, &url)
            .header(AUTH_HEADER, token_str)
            .header("Accept", ACCEPT_HEADER);

        if let Some(content_type) = content_type {
            request = request.header("Content-Type", content_type);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VcloudError::HttpError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| VcloudError::ParseError(e.to_string()))?;

        if !status.is_success() {
            let message = Self::extract_error_message(&text).unwrap_or(text);
            warn!("API 请求失败: {} - {}", status, message);
            return Err(VcloudError::ApiError(status.as_u16(), message));
        }

        XmlElement::parse(&text)
    }

    /// 将相对路径拼接到基础 URL，href 本身为绝对地址时原样使用
    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    /// vCloud 错误响应体为带 message 属性的 Error 元素
    fn extract_error_message(body: &str) -> Option<String> {
        let root = XmlElement::parse(body).ok()?;
        if root.local_name() == "Error" {
            root.attr("message").map(str::to_string)
        } else {
            None
        }
    }

    /// 获取配置（内部使用）
    pub(crate) fn config(&self) -> &VcloudConfig {
        &self.config
    }

    /// 获取登录组织的 href
    pub(crate) async fn org_href(&self) -> Result<String> {
        let org_href = self.org_href.read().await;
        org_href
            .clone()
            .ok_or_else(|| VcloudError::AuthError("未认证，请先登录".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vcloud_client_creation() {
        let client = VcloudClient::new("https://vcloud.example.com/api", VcloudConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let client = VcloudClient::new("not a url", VcloudConfig::default());
        assert!(matches!(client, Err(VcloudError::ConfigError(_))));
    }

    #[test]
    fn test_resolve_url() {
        let client =
            VcloudClient::new("https://vcloud.example.com/api/", VcloudConfig::default()).unwrap();

        assert_eq!(
            client.resolve_url("/vdc/1/action/composeVApp"),
            "https://vcloud.example.com/api/vdc/1/action/composeVApp"
        );
        assert_eq!(
            client.resolve_url("sessions"),
            "https://vcloud.example.com/api/sessions"
        );
        assert_eq!(
            client.resolve_url("https://other.example.com/task/1"),
            "https://other.example.com/task/1"
        );
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"<Error majorErrorCode="400" message="bad compose request"/>"#;
        assert_eq!(
            VcloudClient::extract_error_message(body).as_deref(),
            Some("bad compose request")
        );

        assert!(VcloudClient::extract_error_message("<VApp/>").is_none());
        assert!(VcloudClient::extract_error_message("not xml").is_none());
    }

    #[tokio::test]
    async fn test_request_requires_login() {
        let client =
            VcloudClient::new("https://vcloud.example.com/api", VcloudConfig::default()).unwrap();

        let err = client
            .request(Method::GET, "/vdc/1", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, VcloudError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_org_href_requires_login() {
        let client =
            VcloudClient::new("https://vcloud.example.com/api", VcloudConfig::default()).unwrap();
        assert!(matches!(
            client.org_href().await,
            Err(VcloudError::AuthError(_))
        ));
    }
}
