//! 虚拟数据中心 API

use reqwest::Method;
use tracing::info;

use crate::client::VcloudClient;
use crate::error::{Result, VcloudError};
use crate::models::Vdc;

/// 虚拟数据中心链接的媒体类型
const VDC_TYPE: &str = "application/vnd.vmware.vcloud.vdc+xml";

/// 虚拟数据中心 API
pub struct VdcApi<'a> {
    client: &'a VcloudClient,
}

impl<'a> VdcApi<'a> {
    /// 创建新的数据中心 API 实例
    pub(crate) fn new(client: &'a VcloudClient) -> Self {
        Self { client }
    }

    /// 查询组织下的虚拟数据中心列表
    pub async fn list(&self) -> Result<Vec<Vdc>> {
        info!("查询虚拟数据中心列表");
        let org_href = self.client.org_href().await?;
        let org = self
            .client
            .request(Method::GET, &org_href, None, None)
            .await?;

        Ok(org
            .find_all("Link")
            .into_iter()
            .filter(|link| link.attr("type") == Some(VDC_TYPE))
            .filter_map(|link| {
                Some(Vdc {
                    name: link.attr("name")?.to_string(),
                    href: link.attr("href")?.to_string(),
                })
            })
            .collect())
    }

    /// 取部署目标数据中心
    ///
    /// 部署策略固定为组织下的第一个数据中心。
    pub async fn first(&self) -> Result<Vdc> {
        self.list()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VcloudError::NotFound("组织下没有虚拟数据中心".to_string()))
    }
}
