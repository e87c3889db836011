//! 底层会话
//!
//! 每个后端驱动封装成一个窄接口 (session trait), 只暴露适配器真正需要
//! 的原语操作; 连接建立/传输/认证全部收在这一层之下。适配器的翻译逻辑
//! 因此可以脱离真实存储测试 -- 测试里用脚本化/内存版会话替换驱动实现。
//!
//! 会话在 connect() 之前处于未连接状态, 此时任何操作返回 `NotConnected`;
//! connect/disconnect 幂等, 每个会话对应一条共享物理连接。

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// 关系库会话 (tokio-postgres)
pub mod postgres;

/// 键值库会话 (redis)
pub mod redis;

/// 图库会话 (neo4rs)
pub mod neo4j;

pub use self::neo4j::Neo4jSession;
pub use self::postgres::PgSession;
pub use self::redis::RedisSession;

// ═══════════════════════════════════════════════════════════════════════════
// SQL 参数
// ═══════════════════════════════════════════════════════════════════════════

/// 参数化 SQL 的值
///
/// 统一承载策略层类型化后的字面量, 由各会话实现映射成驱动的参数类型。
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl SqlParam {
    /// JSON 值 → SQL 参数 (数组/对象降级为 JSON 文本)
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => SqlParam::Text(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Int(i),
                None => SqlParam::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Null => SqlParam::Null,
            other => SqlParam::Text(other.to_string()),
        }
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Text(s) => write!(f, "'{}'", s),
            SqlParam::Int(i) => write!(f, "{}", i),
            SqlParam::Float(x) => write!(f, "{}", x),
            SqlParam::Bool(b) => write!(f, "{}", b),
            SqlParam::Null => write!(f, "NULL"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 会话契约
// ═══════════════════════════════════════════════════════════════════════════

/// 关系库会话
#[async_trait]
pub trait SqlSession: Send + Sync {
    async fn connect(&self) -> Result<()>;
    async fn disconnect(&self) -> Result<()>;
    async fn ping(&self) -> Result<bool>;

    /// 执行单列投影为 JSON 文档的查询, 每行返回一个 JSON 值
    async fn query_json(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Value>>;

    /// 执行变更语句, 返回受影响行数
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64>;

    /// 执行单行单列整数查询 (COUNT 等)
    async fn query_scalar(&self, sql: &str) -> Result<i64>;
}

/// 键值库会话
#[async_trait]
pub trait KvSession: Send + Sync {
    async fn connect(&self) -> Result<()>;
    async fn disconnect(&self) -> Result<()>;
    async fn ping(&self) -> Result<bool>;

    async fn get_string(&self, key: &str) -> Result<Option<String>>;
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// 读整个 hash, 键缺失返回空表
    async fn get_hash(&self, key: &str) -> Result<HashMap<String, String>>;
    async fn set_hash(&self, key: &str, fields: &[(String, String)]) -> Result<()>;

    async fn get_document(&self, key: &str) -> Result<Option<Value>>;
    async fn set_document(&self, key: &str, value: &Value) -> Result<()>;

    /// 物理键是否存在
    async fn exists(&self, key: &str) -> Result<bool>;

    /// 删除单个物理键, 返回实际删除数量
    async fn delete(&self, key: &str) -> Result<u64>;

    /// 游标扫描一页匹配键, 返回 (下一游标, 本页键)
    ///
    /// 游标回到 0 表示扫描结束; 调用方必须循环到底, 不能假设结果有界。
    async fn scan_page(
        &self,
        cursor: u64,
        pattern: &str,
        page_size: usize,
    ) -> Result<(u64, Vec<String>)>;
}

/// 图库会话
#[async_trait]
pub trait GraphSession: Send + Sync {
    async fn connect(&self) -> Result<()>;
    async fn disconnect(&self) -> Result<()>;
    async fn ping(&self) -> Result<bool>;

    /// 执行无返回值的 Cypher
    async fn run(&self, cypher: &str, params: &[(String, Value)]) -> Result<()>;

    /// 执行返回单个映射列 (RETURN ... AS alias) 的 Cypher, 取第一行
    async fn fetch_one_map(
        &self,
        cypher: &str,
        params: &[(String, Value)],
        alias: &str,
    ) -> Result<Option<serde_json::Map<String, Value>>>;

    /// 执行返回单个整数列 (RETURN count(..) AS alias) 的 Cypher
    async fn fetch_count(
        &self,
        cypher: &str,
        params: &[(String, Value)],
        alias: &str,
    ) -> Result<i64>;
}
