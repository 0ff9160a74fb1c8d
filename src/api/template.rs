//! vApp 模板 API

use reqwest::Method;
use tracing::info;

use crate::client::VcloudClient;
use crate::error::{Result, VcloudError};
use crate::models::VAppTemplate;
use crate::xml::XmlElement;

/// vApp 模板 API
pub struct TemplateApi<'a> {
    client: &'a VcloudClient,
}

impl<'a> TemplateApi<'a> {
    /// 创建新的模板 API 实例
    pub(crate) fn new(client: &'a VcloudClient) -> Self {
        Self { client }
    }

    /// 查询模板详情
    pub async fn get(&self, template_href: &str) -> Result<VAppTemplate> {
        info!("查询 vApp 模板: {}", template_href);
        let element = self
            .client
            .request(Method::GET, template_href, None, None)
            .await?;
        template_from_element(&element, template_href)
    }

    /// 一次请求同时解析模板详情和其中第一个虚拟机的 href
    ///
    /// 组合 vApp 时两者都要用到，合并请求避免重复查询同一模板。
    pub async fn resolve_source(&self, template_href: &str) -> Result<(VAppTemplate, String)> {
        info!("解析组合来源模板: {}", template_href);
        let element = self
            .client
            .request(Method::GET, template_href, None, None)
            .await?;
        let template = template_from_element(&element, template_href)?;
        let vm_href = extract_first_vm_href(&element, template_href)?;
        Ok((template, vm_href))
    }

    /// 解析模板中第一个虚拟机的 href
    ///
    /// 组合请求的 Source 必须指向模板内的虚拟机实体而非模板本身。
    /// 模板没有 Children 或其中没有 Vm 时返回 `TemplateNoVm`。
    pub async fn first_vm_href(&self, template_href: &str) -> Result<String> {
        info!("解析模板虚拟机: {}", template_href);
        let element = self
            .client
            .request(Method::GET, template_href, None, None)
            .await?;
        extract_first_vm_href(&element, template_href)
    }
}

/// 从模板描述中提取名称和 href
fn template_from_element(element: &XmlElement, template_href: &str) -> Result<VAppTemplate> {
    let name = element
        .attr("name")
        .ok_or_else(|| VcloudError::MalformedResponse("模板缺少 name 属性".to_string()))?
        .to_string();
    let href = element.attr("href").unwrap_or(template_href).to_string();

    Ok(VAppTemplate { name, href })
}

/// 从模板描述中取第一个虚拟机的 href
fn extract_first_vm_href(element: &XmlElement, template_href: &str) -> Result<String> {
    let children = element
        .find("Children")
        .ok_or_else(|| VcloudError::TemplateNoVm(template_href.to_string()))?;
    let vm = children
        .find("Vm")
        .ok_or_else(|| VcloudError::TemplateNoVm(template_href.to_string()))?;

    vm.attr("href")
        .map(str::to_string)
        .ok_or_else(|| VcloudError::MalformedResponse("模板虚拟机缺少 href 属性".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_first_vm_href() {
        let xml = r#"<VAppTemplate name="ubuntu-template">
            <Children>
                <Vm href="/vm/123" name="vm-1"/>
                <Vm href="/vm/124" name="vm-2"/>
            </Children>
        </VAppTemplate>"#;
        let element = XmlElement::parse(xml).unwrap();

        let href = extract_first_vm_href(&element, "/template/1").unwrap();
        assert_eq!(href, "/vm/123");
    }

    #[test]
    fn test_template_and_vm_from_same_document() {
        let xml = r#"<VAppTemplate name="ubuntu-template" href="/template/1">
            <Children>
                <Vm href="/vm/123" name="vm-1"/>
            </Children>
        </VAppTemplate>"#;
        let element = XmlElement::parse(xml).unwrap();

        let template = template_from_element(&element, "/template/1").unwrap();
        let vm_href = extract_first_vm_href(&element, "/template/1").unwrap();
        assert_eq!(template.name, "ubuntu-template");
        assert_eq!(vm_href, "/vm/123");
    }

    #[test]
    fn test_template_without_name() {
        let element = XmlElement::parse(r#"<VAppTemplate href="/template/1"/>"#).unwrap();

        assert!(matches!(
            template_from_element(&element, "/template/1"),
            Err(VcloudError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_template_without_children() {
        let element = XmlElement::parse(r#"<VAppTemplate name="empty"/>"#).unwrap();

        assert!(matches!(
            extract_first_vm_href(&element, "/template/1"),
            Err(VcloudError::TemplateNoVm(_))
        ));
    }

    #[test]
    fn test_template_with_empty_children() {
        let element =
            XmlElement::parse(r#"<VAppTemplate name="empty"><Children/></VAppTemplate>"#).unwrap();

        assert!(matches!(
            extract_first_vm_href(&element, "/template/1"),
            Err(VcloudError::TemplateNoVm(_))
        ));
    }

    #[test]
    fn test_template_vm_without_href() {
        let element = XmlElement::parse(
            r#"<VAppTemplate><Children><Vm name="vm-1"/></Children></VAppTemplate>"#,
        )
        .unwrap();

        assert!(matches!(
            extract_first_vm_href(&element, "/template/1"),
            Err(VcloudError::MalformedResponse(_))
        ));
    }
}
