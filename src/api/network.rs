//! 组织网络 API

use reqwest::Method;
use tracing::info;

use crate::client::VcloudClient;
use crate::error::{Result, VcloudError};
use crate::models::OrgNetwork;

/// 组织网络链接的媒体类型
const ORG_NETWORK_TYPE: &str = "application/vnd.vmware.vcloud.orgNetwork+xml";

/// 组织网络 API
pub struct NetworkApi<'a> {
    client: &'a VcloudClient,
}

impl<'a> NetworkApi<'a> {
    /// 创建新的网络 API 实例
    pub(crate) fn new(client: &'a VcloudClient) -> Self {
        Self { client }
    }

    /// 查询组织网络列表
    pub async fn list(&self) -> Result<Vec<OrgNetwork>> {
        info!("查询组织网络列表");
        let org_href = self.client.org_href().await?;
        let org = self
            .client
            .request(Method::GET, &org_href, None, None)
            .await?;

        Ok(org
            .find_all("Link")
            .into_iter()
            .filter(|link| link.attr("type") == Some(ORG_NETWORK_TYPE))
            .filter_map(|link| {
                Some(OrgNetwork {
                    name: link.attr("name")?.to_string(),
                    href: link.attr("href")?.to_string(),
                })
            })
            .collect())
    }

    /// 取 vApp 挂接的组织网络
    ///
    /// 挂接策略固定为组织下的第一个网络。
    pub async fn first(&self) -> Result<OrgNetwork> {
        self.list()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VcloudError::NotFound("组织下没有可用网络".to_string()))
    }
}
