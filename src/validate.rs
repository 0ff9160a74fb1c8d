//! 虚拟机参数校验
//!
//! 平台对虚拟机名称、CPU 和内存有硬性约束，提交前在客户端侧先行检查，
//! 避免组合请求在服务端失败后才暴露问题。

use crate::error::{Result, VcloudError};

/// 虚拟机名称最大长度
pub const VM_NAME_MAX_LEN: usize = 15;

/// 允许的 CPU 核心数范围
pub const VM_CPU_MIN: u32 = 1;
pub const VM_CPU_MAX: u32 = 8;

/// 允许的内存范围 (MB)，且须为 4 的倍数
pub const VM_MEMORY_MIN: u64 = 512;
pub const VM_MEMORY_MAX: u64 = 65536;

/// 校验单个虚拟机名称
///
/// 名称须符合主机名规则：非空、最长 15 字符、以字母开头、
/// 其余字符为字母/数字/连字符。
pub fn validate_vm_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VcloudError::InvalidInput("虚拟机名称不能为空".to_string()));
    }
    if name.len() > VM_NAME_MAX_LEN {
        return Err(VcloudError::InvalidInput(format!(
            "虚拟机名称 {} 超过 {} 字符",
            name, VM_NAME_MAX_LEN
        )));
    }

    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !first.is_ascii_alphabetic() {
        return Err(VcloudError::InvalidInput(format!(
            "虚拟机名称 {} 必须以字母开头",
            name
        )));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(VcloudError::InvalidInput(format!(
            "虚拟机名称 {} 只能包含字母、数字和连字符",
            name
        )));
    }

    Ok(())
}

/// 校验虚拟机名称列表，`None` 表示沿用模板内名称
pub fn validate_vm_names(names: Option<&[String]>) -> Result<()> {
    if let Some(names) = names {
        for name in names {
            validate_vm_name(name)?;
        }
    }
    Ok(())
}

/// 校验 CPU 核心数，`None` 表示沿用模板配置
pub fn validate_vm_cpu(cpu: Option<u32>) -> Result<()> {
    if let Some(cpu) = cpu {
        if !(VM_CPU_MIN..=VM_CPU_MAX).contains(&cpu) {
            return Err(VcloudError::InvalidInput(format!(
                "CPU 核心数 {} 超出范围 [{}, {}]",
                cpu, VM_CPU_MIN, VM_CPU_MAX
            )));
        }
    }
    Ok(())
}

/// 校验内存大小，`None` 表示沿用模板配置
pub fn validate_vm_memory(memory: Option<u64>) -> Result<()> {
    if let Some(memory) = memory {
        if !(VM_MEMORY_MIN..=VM_MEMORY_MAX).contains(&memory) {
            return Err(VcloudError::InvalidInput(format!(
                "内存大小 {} MB 超出范围 [{}, {}]",
                memory, VM_MEMORY_MIN, VM_MEMORY_MAX
            )));
        }
        if memory % 4 != 0 {
            return Err(VcloudError::InvalidInput(format!(
                "内存大小 {} MB 必须为 4 的倍数",
                memory
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_vm_names() {
        assert!(validate_vm_name("box1").is_ok());
        assert!(validate_vm_name("web-server-01").is_ok());
        assert!(validate_vm_name("a").is_ok());
    }

    #[test]
    fn test_invalid_vm_names() {
        assert!(validate_vm_name("").is_err());
        assert!(validate_vm_name("a-very-long-vm-name").is_err());
        assert!(validate_vm_name("1box").is_err());
        assert!(validate_vm_name("-box").is_err());
        assert!(validate_vm_name("box_1").is_err());
        assert!(validate_vm_name("box 1").is_err());
    }

    #[test]
    fn test_vm_name_list() {
        assert!(validate_vm_names(None).is_ok());

        let names = vec!["box1".to_string(), "box2".to_string()];
        assert!(validate_vm_names(Some(&names)).is_ok());

        let names = vec!["box1".to_string(), "bad name".to_string()];
        assert!(validate_vm_names(Some(&names)).is_err());
    }

    #[test]
    fn test_vm_cpu_bounds() {
        assert!(validate_vm_cpu(None).is_ok());
        assert!(validate_vm_cpu(Some(1)).is_ok());
        assert!(validate_vm_cpu(Some(8)).is_ok());
        assert!(validate_vm_cpu(Some(0)).is_err());
        assert!(validate_vm_cpu(Some(9)).is_err());
    }

    #[test]
    fn test_vm_memory_bounds() {
        assert!(validate_vm_memory(None).is_ok());
        assert!(validate_vm_memory(Some(512)).is_ok());
        assert!(validate_vm_memory(Some(2048)).is_ok());
        assert!(validate_vm_memory(Some(256)).is_err());
        assert!(validate_vm_memory(Some(131072)).is_err());
        assert!(validate_vm_memory(Some(1026)).is_err());
    }
}
