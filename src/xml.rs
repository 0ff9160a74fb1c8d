//! vCloud XML 编解码
//!
//! 提供两部分能力：
//! - `XmlElement`: 基于 quick-xml 的轻量元素树，负责响应解析与确定性序列化
//! - `ComposeVAppXml`: vCloud 1.5 组合 vApp 请求文档构造器

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, VcloudError};
use crate::models::OrgNetwork;

/// XML 元素节点
///
/// 元素名保留原始前缀（如 `ns6:Source`），查找接口按本地名匹配，
/// 属性按原始键精确匹配。
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// 元素名（含前缀）
    pub name: String,

    /// 属性列表（保持文档顺序）
    pub attributes: Vec<(String, String)>,

    /// 子元素列表
    pub children: Vec<XmlElement>,

    /// 文本内容
    pub text: Option<String>,
}

impl XmlElement {
    /// 创建空元素
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// 追加属性
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    /// 设置文本内容
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// 追加子元素
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// 元素本地名（去掉命名空间前缀）
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// 按原始键查找属性
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 按本地名查找第一个直接子元素
    pub fn find(&self, local_name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.local_name() == local_name)
    }

    /// 按本地名查找第一个直接子元素（可变引用）
    pub fn find_mut(&mut self, local_name: &str) -> Option<&mut XmlElement> {
        self.children
            .iter_mut()
            .find(|c| c.local_name() == local_name)
    }

    /// 按本地名查找所有直接子元素
    pub fn find_all(&self, local_name: &str) -> Vec<&XmlElement> {
        self.children
            .iter()
            .filter(|c| c.local_name() == local_name)
            .collect()
    }

    /// 深度优先查找第一个匹配本地名的后代元素
    pub fn find_descendant(&self, local_name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.local_name() == local_name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(local_name) {
                return Some(found);
            }
        }
        None
    }

    /// 解析 XML 文档，返回根元素
    pub fn parse(xml: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| VcloudError::ParseError(e.to_string()))?;

            match event {
                Event::Start(e) => stack.push(Self::from_start(&e)?),
                Event::Empty(e) => {
                    let element = Self::from_start(&e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| VcloudError::ParseError(e.to_string()))?;
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        if let Some(top) = stack.last_mut() {
                            top.text = Some(trimmed.to_string());
                        }
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| VcloudError::ParseError("意外的结束标签".to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Eof => {
                    return Err(VcloudError::ParseError("XML 文档不完整".to_string()));
                }
                // 声明、注释、CDATA 等跳过
                _ => {}
            }
        }
    }

    fn from_start(e: &BytesStart<'_>) -> Result<XmlElement> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attributes = Vec::new();

        for attr in e.attributes() {
            let attr = attr.map_err(|e| VcloudError::ParseError(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| VcloudError::ParseError(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(XmlElement {
            name,
            attributes,
            children: Vec::new(),
            text: None,
        })
    }

    /// 序列化为 XML 文本
    ///
    /// 输出与树结构一一对应，对同一棵树重复调用结果逐字节一致。
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_into(&mut writer)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| VcloudError::ParseError(e.to_string()))
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| VcloudError::ParseError(e.to_string()));
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| VcloudError::ParseError(e.to_string()))?;

        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| VcloudError::ParseError(e.to_string()))?;
        }

        for child in &self.children {
            child.write_into(writer)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|e| VcloudError::ParseError(e.to_string()))
    }
}

/// vCloud 1.5 组合 vApp 请求文档
///
/// 构造时立即生成完整 XML 树，文档结构固定：
/// - 根元素携带 vApp 名称、语言属性和八个命名空间声明
/// - `InstantiationParams` → 网络配置段（桥接模式绑定组织网络）
/// - `SourcedItem` → 模板虚拟机来源 + 每虚拟机实例化参数
///   （网络连接段 + 来宾定制段）
///
/// 不做输入校验：上游保证参数合法，否则产出语法正确但语义错误的文档。
pub struct ComposeVAppXml {
    root: XmlElement,
}

impl ComposeVAppXml {
    /// 构造组合请求
    ///
    /// # Arguments
    /// * `name` - 新 vApp 名称（同时作为来宾计算机名）
    /// * `template_name` - 模板显示名称
    /// * `template_vm_href` - 模板中第一个虚拟机的 href
    /// * `network` - 要桥接的组织网络
    pub fn new(
        name: &str,
        template_name: &str,
        template_vm_href: &str,
        network: &OrgNetwork,
    ) -> Self {
        let root = Self::instantiation_root(name)
            .with_child(Self::instantiation_params(network))
            .with_child(Self::sourced_item(
                name,
                template_name,
                template_vm_href,
                network,
            ));
        Self { root }
    }

    /// 序列化请求文档（幂等，可重复调用）
    pub fn to_xml(&self) -> Result<String> {
        self.root.to_xml()
    }

    fn instantiation_root(name: &str) -> XmlElement {
        XmlElement::new("ns6:ComposeVAppParams")
            .with_attr("name", name)
            .with_attr("xml:lang", "en")
            .with_attr("xmlns", "http://www.vmware.com/vcloud/v1.5")
            .with_attr("xmlns:ns2", "http://schemas.dmtf.org/wbem/wscim/1/common")
            .with_attr(
                "xmlns:ns3",
                "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_VirtualSystemSettingData",
            )
            .with_attr("xmlns:ns4", "http://schemas.dmtf.org/ovf/envelope/1")
            .with_attr(
                "xmlns:ns5",
                "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_ResourceAllocationSettingData",
            )
            .with_attr("xmlns:ns6", "http://www.vmware.com/vcloud/v1.5")
            .with_attr("xmlns:ns7", "http://www.vmware.com/vcloud/extension/v1.5")
            .with_attr("xmlns:ns8", "http://schemas.dmtf.org/ovf/environment/1")
    }

    fn instantiation_params(network: &OrgNetwork) -> XmlElement {
        XmlElement::new("ns6:InstantiationParams").with_child(Self::network_config(network))
    }

    fn network_config(network: &OrgNetwork) -> XmlElement {
        XmlElement::new("ns6:NetworkConfigSection")
            .with_child(XmlElement::new("ns4:Info"))
            .with_child(
                XmlElement::new("ns6:NetworkConfig")
                    .with_attr("networkName", &network.name)
                    .with_child(
                        XmlElement::new("ns6:Configuration")
                            .with_child(
                                XmlElement::new("ns6:ParentNetwork")
                                    .with_attr("name", &network.name)
                                    .with_attr(
                                        "type",
                                        "application/vnd.vmware.vcloud.network+xml",
                                    )
                                    .with_attr("href", &network.href),
                            )
                            .with_child(
                                XmlElement::new("ns6:FenceMode").with_text("bridged"),
                            ),
                    ),
            )
    }

    fn sourced_item(
        name: &str,
        template_name: &str,
        template_vm_href: &str,
        network: &OrgNetwork,
    ) -> XmlElement {
        XmlElement::new("ns6:SourcedItem")
            .with_child(
                XmlElement::new("ns6:Source")
                    .with_attr("name", template_name)
                    .with_attr("href", template_vm_href),
            )
            .with_child(
                XmlElement::new("ns6:InstantiationParams")
                    .with_child(Self::network_connection_section(network))
                    .with_child(Self::guest_customization_section(name, template_vm_href)),
            )
    }

    fn network_connection_section(network: &OrgNetwork) -> XmlElement {
        XmlElement::new("ns6:NetworkConnectionSection")
            .with_child(XmlElement::new("ns4:Info"))
            .with_child(
                XmlElement::new("ns6:NetworkConnection")
                    .with_attr("network", &network.name)
                    .with_child(
                        XmlElement::new("ns6:NetworkConnectionIndex").with_text("0"),
                    )
                    .with_child(XmlElement::new("ns6:IsConnected").with_text("true"))
                    .with_child(
                        XmlElement::new("ns6:IpAddressAllocationMode").with_text("POOL"),
                    ),
            )
    }

    fn guest_customization_section(name: &str, template_vm_href: &str) -> XmlElement {
        XmlElement::new("ns6:GuestCustomizationSection")
            .with_attr(
                "type",
                "application/vnd.vmware.vcloud.guestCustomizationSection+xml",
            )
            .with_attr(
                "href",
                &format!("{}/guestCustomizationSection/", template_vm_href),
            )
            .with_attr("ns4:required", "false")
            .with_child(
                XmlElement::new("ns4:Info").with_text("Specifies Guest OS Customization Settings"),
            )
            .with_child(XmlElement::new("ns6:Enabled").with_text("true"))
            .with_child(XmlElement::new("ns6:AdminPasswordEnabled").with_text("true"))
            .with_child(XmlElement::new("ns6:AdminPasswordAuto").with_text("true"))
            .with_child(XmlElement::new("ns6:ResetPasswordRequired").with_text("false"))
            .with_child(XmlElement::new("ns6:ComputerName").with_text(name))
    }
}
