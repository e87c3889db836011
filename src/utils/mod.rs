//! 工具模块

/// 配置管理
pub mod config;

/// 字段命名归一化
pub mod naming;
