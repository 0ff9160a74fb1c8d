//! vApp 管理 API
//!
//! 提供 vApp 生命周期操作，包括：
//! - 从模板组合创建（含 CPU/内存配置与开机的完整编排）
//! - 查询 vApp 列表、按名称定位
//! - 开机、修改虚拟机 CPU/内存

use reqwest::Method;
use tracing::{debug, info};

use crate::client::VcloudClient;
use crate::error::{Result, VcloudError};
use crate::models::{CreateVAppRequest, OrgNetwork, Task, VApp, VAppStatus, VAppTemplate, Vdc};
use crate::validate;
use crate::xml::ComposeVAppXml;

/// 组合请求体的媒体类型
const COMPOSE_TYPE: &str = "application/vnd.vmware.vcloud.composeVAppParams+xml";

/// 硬件配置项的媒体类型
const RASD_ITEM_TYPE: &str = "application/vnd.vmware.vcloud.rasdItem+xml";

/// vApp 资源实体的媒体类型
const VAPP_TYPE: &str = "application/vnd.vmware.vcloud.vApp+xml";

/// vApp 管理 API
pub struct VAppApi<'a> {
    client: &'a VcloudClient,
}

impl<'a> VAppApi<'a> {
    /// 创建新的 vApp API 实例
    pub(crate) fn new(client: &'a VcloudClient) -> Self {
        Self { client }
    }

    /// 从模板创建 vApp
    ///
    /// 完整编排流程：
    /// 1. 校验虚拟机名称 / CPU / 内存
    /// 2. 解析模板中第一个虚拟机的 href
    /// 3. 取第一个数据中心和第一个组织网络（固定部署策略）
    /// 4. 提交组合请求并等待任务完成
    /// 5. 对新 vApp 的每台虚拟机下发 CPU / 内存配置
    /// 6. 按名称定位新 vApp；`deploy` 为真时开机
    /// 7. 重新查询并返回最终状态
    ///
    /// 中途失败直接返回错误，不回收已组合的 vApp。
    pub async fn create(&self, req: CreateVAppRequest) -> Result<VApp> {
        info!("创建 vApp: {} (模板: {})", req.name, req.template_href);

        validate::validate_vm_names(req.vm_names.as_deref())?;
        validate::validate_vm_cpu(req.cpu)?;
        validate::validate_vm_memory(req.memory)?;

        let (template, template_vm_href) = self
            .client
            .template()
            .resolve_source(&req.template_href)
            .await?;

        let vdc = self.client.vdc().first().await?;
        let network = self.client.network().first().await?;

        let vapp_href = self
            .compose(&req.name, &template, &template_vm_href, &network, &vdc)
            .await?;

        // CPU/内存在组合完成后逐台虚拟机下发
        if req.cpu.is_some() || req.memory.is_some() {
            for vm_href in self.vm_hrefs(&vapp_href).await? {
                if let Some(cpu) = req.cpu {
                    self.set_vm_cpu(&vm_href, cpu).await?;
                }
                if let Some(memory) = req.memory {
                    self.set_vm_memory(&vm_href, memory).await?;
                }
            }
        }

        let vapp = self.find_by_name(&req.name).await?;
        if req.deploy {
            self.power_on(&vapp.href).await?;
        }

        // 开机/配置之后刷新状态再返回
        self.find_by_name(&req.name).await
    }

    /// 提交组合请求，等待任务完成，返回新 vApp 的 href
    async fn compose(
        &self,
        name: &str,
        template: &VAppTemplate,
        template_vm_href: &str,
        network: &OrgNetwork,
        vdc: &Vdc,
    ) -> Result<String> {
        info!("组合 vApp: {} @ {}", name, vdc.name);

        let request_xml =
            ComposeVAppXml::new(name, &template.name, template_vm_href, network).to_xml()?;
        debug!("组合请求体 {} 字节", request_xml.len());

        let response = self
            .client
            .request(
                Method::POST,
                &format!("{}/action/composeVApp", vdc.href),
                Some(request_xml),
                Some(COMPOSE_TYPE),
            )
            .await?;

        let tasks = response.find("Tasks").ok_or_else(|| {
            VcloudError::MalformedResponse("组合响应缺少 Tasks 元素".to_string())
        })?;
        let task_element = tasks.find("Task").ok_or_else(|| {
            VcloudError::MalformedResponse("组合响应缺少 Task 元素".to_string())
        })?;

        // 无 href 的任务即提交失败，在解析时携带平台错误消息返回
        let task = Task::from_element(task_element)?;
        self.client.task().wait(&task.href).await?;

        response
            .attr("href")
            .map(str::to_string)
            .ok_or_else(|| VcloudError::MalformedResponse("组合响应缺少 vApp href".to_string()))
    }

    /// 查询数据中心下的 vApp 列表
    pub async fn list(&self) -> Result<Vec<VApp>> {
        info!("查询 vApp 列表");
        let vdc = self.client.vdc().first().await?;
        let vdc_detail = self
            .client
            .request(Method::GET, &vdc.href, None, None)
            .await?;

        let mut vapps = Vec::new();
        if let Some(entities) = vdc_detail.find("ResourceEntities") {
            for entity in entities.find_all("ResourceEntity") {
                if entity.attr("type") != Some(VAPP_TYPE) {
                    continue;
                }
                let href = match entity.attr("href") {
                    Some(href) => href.to_string(),
                    None => continue,
                };
                vapps.push(self.get(&href).await?);
            }
        }

        Ok(vapps)
    }

    /// 查询单个 vApp
    pub async fn get(&self, vapp_href: &str) -> Result<VApp> {
        debug!("查询 vApp 详情: {}", vapp_href);
        let element = self
            .client
            .request(Method::GET, vapp_href, None, None)
            .await?;

        let name = element
            .attr("name")
            .ok_or_else(|| VcloudError::MalformedResponse("vApp 缺少 name 属性".to_string()))?
            .to_string();
        let href = element.attr("href").unwrap_or(vapp_href).to_string();
        let status = element
            .attr("status")
            .and_then(|s| s.parse::<i32>().ok())
            .map(VAppStatus::from_code)
            .unwrap_or(VAppStatus::Unknown(-1));

        Ok(VApp { name, href, status })
    }

    /// 按名称定位 vApp
    ///
    /// 名称重复时取列表顺序中的第一个。
    pub async fn find_by_name(&self, name: &str) -> Result<VApp> {
        self.list()
            .await?
            .into_iter()
            .find(|vapp| vapp.name == name)
            .ok_or_else(|| VcloudError::NotFound(format!("vApp: {}", name)))
    }

    /// 查询 vApp 下属虚拟机的 href 列表
    pub async fn vm_hrefs(&self, vapp_href: &str) -> Result<Vec<String>> {
        let element = self
            .client
            .request(Method::GET, vapp_href, None, None)
            .await?;

        let hrefs = match element.find("Children") {
            Some(children) => children
                .find_all("Vm")
                .into_iter()
                .filter_map(|vm| vm.attr("href"))
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };
        Ok(hrefs)
    }

    /// 启动 vApp，等待任务完成
    pub async fn power_on(&self, vapp_href: &str) -> Result<()> {
        info!("启动 vApp: {}", vapp_href);
        let response = self
            .client
            .request(
                Method::POST,
                &format!("{}/power/action/powerOn", vapp_href),
                None,
                None,
            )
            .await?;

        let task = Task::from_element(&response)?;
        self.client.task().wait(&task.href).await?;
        Ok(())
    }

    /// 设置虚拟机 CPU 核心数，等待任务完成
    pub async fn set_vm_cpu(&self, vm_href: &str, cpu: u32) -> Result<()> {
        info!("设置虚拟机 CPU: {} -> {}", vm_href, cpu);
        self.update_hardware_item(vm_href, "cpu", &cpu.to_string())
            .await
    }

    /// 设置虚拟机内存 (MB)，等待任务完成
    pub async fn set_vm_memory(&self, vm_href: &str, memory_mb: u64) -> Result<()> {
        info!("设置虚拟机内存: {} -> {} MB", vm_href, memory_mb);
        self.update_hardware_item(vm_href, "memory", &memory_mb.to_string())
            .await
    }

    /// 修改虚拟硬件配置项
    ///
    /// 先 GET 现有 rasd Item，改写 VirtualQuantity 后原样 PUT 回去，
    /// 保持平台生成的其余字段不变。
    async fn update_hardware_item(
        &self,
        vm_href: &str,
        section: &str,
        quantity: &str,
    ) -> Result<()> {
        let url = format!("{}/virtualHardwareSection/{}", vm_href, section);
        let mut item = self.client.request(Method::GET, &url, None, None).await?;

        match item.find_mut("VirtualQuantity") {
            Some(element) => element.text = Some(quantity.to_string()),
            None => {
                return Err(VcloudError::MalformedResponse(
                    "硬件配置项缺少 VirtualQuantity".to_string(),
                ))
            }
        }

        let response = self
            .client
            .request(
                Method::PUT,
                &url,
                Some(item.to_xml()?),
                Some(RASD_ITEM_TYPE),
            )
            .await?;

        let task = Task::from_element(&response)?;
        self.client.task().wait(&task.href).await?;
        Ok(())
    }
}
