//! 统一连接器契约
//!
//! 每个物理后端一个适配器, 全部实现同一套操作集合:
//! connect/disconnect/ping/count/get/insert/update/delete/raw_query。
//! 适配器负责把统一契约翻译成各后端的原生语句, 并把结果经命名归一化
//! 之后以统一的 `Record` 形状返回; 上层策略不感知任何后端差异。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{PolyError, Result};

/// 关系库适配器
pub mod relational;

/// 键值库适配器
pub mod keyvalue;

/// 图库适配器
pub mod graph;

pub use graph::GraphConnector;
pub use keyvalue::KeyValueConnector;
pub use relational::RelationalConnector;

// ═══════════════════════════════════════════════════════════════════════════
// 后端标识
// ═══════════════════════════════════════════════════════════════════════════

/// 物理后端标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// 关系库 (表模型)
    Relational,
    /// 键值库 (前缀键模型)
    KeyValue,
    /// 图库 (标签-属性模型)
    Graph,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Relational => "relational",
            Backend::KeyValue => "keyvalue",
            Backend::Graph => "graph",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = PolyError;

    /// 接受规范名与历史别名 (pg/postgres, redis/kv, neo4j)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "relational" | "postgres" | "pg" => Ok(Backend::Relational),
            "keyvalue" | "kv" | "redis" => Ok(Backend::KeyValue),
            "graph" | "neo4j" => Ok(Backend::Graph),
            other => Err(PolyError::UnknownBackend(other.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 记录与编码
// ═══════════════════════════════════════════════════════════════════════════

/// 归一化记录: camelCase 字段名 → JSON 值
pub type Record = serde_json::Map<String, Value>;

/// 键值库的值编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvEncoding {
    /// 整条记录序列化为 JSON 字符串存入单个 key
    String,
    /// 每个属性一个 hash field
    Hash,
    /// 结构化文档 (RedisJSON)
    Document,
}

impl FromStr for KvEncoding {
    type Err = PolyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(KvEncoding::String),
            "hash" => Ok(KvEncoding::Hash),
            "document" | "json" => Ok(KvEncoding::Document),
            other => Err(PolyError::UnsupportedEncoding(other.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 连接器契约
// ═══════════════════════════════════════════════════════════════════════════

/// 连接器统一契约
///
/// 所有操作都是对单个逻辑实体的单次往返; connect 前调用任何操作返回
/// `NotConnected`。connect/disconnect 幂等, 整个门面生命周期内每个后端
/// 只有一个共享会话。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// 建立共享会话 (幂等)
    async fn connect(&self) -> Result<()>;

    /// 释放共享会话 (幂等)
    async fn disconnect(&self) -> Result<()>;

    /// 探活
    async fn ping(&self) -> Result<bool>;

    /// 实体总数
    async fn count(&self, entity: &str) -> Result<i64>;

    /// 按主键点查, 无命中返回 None
    async fn get(&self, entity: &str, pk_field: &str, pk_value: &Value)
        -> Result<Option<Record>>;

    /// 写入一条记录, 回显归一化后的存储结果
    async fn insert(&self, entity: &str, payload: Record) -> Result<Record>;

    /// 按主键点更新, 返回实际变更条数 (0 或 1)
    async fn update(
        &self,
        entity: &str,
        pk_field: &str,
        pk_value: &Value,
        payload: Record,
    ) -> Result<u64>;

    /// 按主键点删除, 返回实际删除条数 (缺失返回 0, 不报错)
    async fn delete(&self, entity: &str, pk_field: &str, pk_value: &Value) -> Result<u64>;

    /// 透传一条后端原生查询 (不支持的后端返回 UnsupportedQuery)
    async fn raw_query(&self, native: &str) -> Result<Vec<Record>>;
}

// ═══════════════════════════════════════════════════════════════════════════
// 连接器注册表
// ═══════════════════════════════════════════════════════════════════════════

/// 后端 → 连接器实例
///
/// 由路由门面独占持有, 构造时一次性填充, 之后只读;
/// 策略按调用借用, 不存在全局单例。
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<Backend, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    /// 注册一个后端连接器, 同后端后注册者覆盖先注册者
    pub fn register(&mut self, backend: Backend, connector: Arc<dyn Connector>) {
        self.connectors.insert(backend, connector);
    }

    pub fn get(&self, backend: Backend) -> Option<Arc<dyn Connector>> {
        self.connectors.get(&backend).cloned()
    }

    /// 取连接器, 未注册时报 UnknownBackend
    pub fn require(&self, backend: Backend) -> Result<Arc<dyn Connector>> {
        self.get(backend)
            .ok_or_else(|| PolyError::UnknownBackend(backend.to_string()))
    }

    pub fn backends(&self) -> Vec<Backend> {
        self.connectors.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Backend, &Arc<dyn Connector>)> {
        self.connectors.iter()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}
