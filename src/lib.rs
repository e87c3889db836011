//! # POLYROUTE-RS
//!
//! 多模数据库统一查询路由 - 单一 SQL 入口访问异构存储
//!
//! ## 核心能力
//!
//! - **目录解析**: 逻辑实体 → (后端, 主键字段) 映射, 支持外部覆盖文件
//! - **统一连接器**: ping/count/get/insert/update/delete/raw_query 固定契约
//! - **存储适配**: 关系库(按表)/键值库(按前缀键, 三种编码)/图库(按标签)
//! - **执行策略**: SELECT/INSERT/UPDATE/DELETE 各一策略, 强制主键点访问
//! - **结果归一化**: 任意后端返回统一 camelCase 字段的记录
//!
//! ## 架构设计
//!
//! ```text
//! 调用方 (SQL 字符串)
//!     ↓
//! Router Facade (router/) ← 目录解析 / 显式后端覆盖
//!     ↓
//! SQL 子集解析 (parser/) ← sqlparser
//!     ↓
//! Execution Strategy (strategy/) ← 按语句类型静态分发
//!     ↓
//! Connector (connector/) ← 统一契约 → 各后端原生语句
//!     ↓
//! Wire Session (wire/) ← tokio-postgres / redis / neo4rs
//! ```
//!
//! ## 设计约束
//!
//! - 变更与点查一律按声明的主键寻址, 谓词列不匹配即报错
//! - 单语句单后端单次往返, 无跨库事务, 无重试, 无缓存
//! - 后端原生错误原样上抛, 本层不猜测兜底

#![allow(dead_code)]

// ============================================================================
// 外部依赖
// ============================================================================

// 异步运行时
pub use futures;
pub use tokio;

// 序列化
pub use serde;
pub use serde_json;

// 日志
pub use log;

// 错误处理
pub use thiserror;

// ============================================================================
// 内部模块
// ============================================================================

/// 逻辑实体目录 - 实体名 → (后端, 主键字段)
pub mod catalogue;

/// 统一连接器契约与三种存储适配器
pub mod connector;

/// SQL 子集解析 (sqlparser 封装)
pub mod parser;

/// 路由门面 - 对外统一入口
pub mod router;

/// 执行策略 - 按语句类型分发
pub mod strategy;

/// 工具模块 (命名归一化 / 配置)
pub mod utils;

/// 底层会话 - 各后端驱动的最小封装
pub mod wire;

// ============================================================================
// 常用类型重导出
// ============================================================================

pub use catalogue::{Catalogue, CatalogueEntry};
pub use connector::{Backend, Connector, ConnectorRegistry, KvEncoding, Record};
pub use parser::{Literal, ParsedStatement, Predicate, Projection, StatementKind};
pub use router::PolyClient;
pub use strategy::QueryOutput;
pub use utils::config::PolyConfig;

// ============================================================================
// 全局错误类型
// ============================================================================

/// 路由层错误类型
///
/// 每个变体对应一条被违反的约束, 调用方据此修正语句即可;
/// 后端原生错误以 transparent 形式原样上抛, 不做包装。
#[derive(Debug, thiserror::Error)]
pub enum PolyError {
    #[error("Unknown entity: '{0}' not found in catalogue")]
    UnknownEntity(String),

    #[error("Unknown backend: no connector registered for '{0}'")]
    UnknownBackend(String),

    #[error("Ambiguous target: neither an explicit backend nor catalogue resolution was requested")]
    AmbiguousTarget,

    #[error("Conflicting target: explicit backend '{requested}' disagrees with catalogue backend '{catalogued}' for '{entity}'")]
    ConflictingTarget {
        entity: String,
        requested: String,
        catalogued: String,
    },

    #[error("Primary key mismatch: '{table}' must be addressed by primary key '{expected}', got '{found}'")]
    PrimaryKeyMismatch {
        table: String,
        expected: String,
        found: String,
    },

    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Not connected: {0} connector used before connect()")]
    NotConnected(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("SQL parse error: {0}")]
    ParseError(#[from] sqlparser::parser::ParserError),

    #[error(transparent)]
    RelationalError(#[from] tokio_postgres::Error),

    #[error(transparent)]
    KeyValueError(#[from] redis::RedisError),

    #[error(transparent)]
    GraphError(#[from] neo4rs::Error),

    #[error("Store error: {0}")]
    StoreError(String),
}

pub type Result<T> = std::result::Result<T, PolyError>;
