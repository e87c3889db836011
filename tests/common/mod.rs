// 集成测试公共设施: 三种后端会话的脱机替身
//
// - MemoryKvSession: 真实语义的内存键值库, 扫描带翻页
// - ScriptedSqlSession: 记录语句与参数, 按队列回放结果
// - ScriptedGraphSession: 记录 Cypher 与参数, 按队列回放结果

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use polyroute::connector::{GraphConnector, KeyValueConnector, RelationalConnector};
use polyroute::wire::{GraphSession, KvSession, SqlParam, SqlSession};
use polyroute::{Backend, Catalogue, ConnectorRegistry, KvEncoding, PolyClient, Result};

// ═══════════════════════════════════════════════════════════════════════════
// 测试装配: 三个假后端 + 定制目录的完整客户端
// ═══════════════════════════════════════════════════════════════════════════

pub struct Harness {
    pub client: PolyClient,
    pub relational: Arc<RelationalConnector<ScriptedSqlSession>>,
    pub keyvalue: Arc<KeyValueConnector<MemoryKvSession>>,
    pub graph: Arc<GraphConnector<ScriptedGraphSession>>,
}

/// 目录: 内置缺省 + customer 改指键值库 (主键 id)
pub fn harness(encoding: KvEncoding) -> Harness {
    harness_with_kv(encoding, MemoryKvSession::default())
}

pub fn harness_with_kv(encoding: KvEncoding, kv_session: MemoryKvSession) -> Harness {
    let relational = Arc::new(RelationalConnector::from_session(
        ScriptedSqlSession::default(),
    ));
    let keyvalue = Arc::new(KeyValueConnector::from_session(kv_session, encoding, "id"));
    let graph = Arc::new(GraphConnector::from_session(ScriptedGraphSession::default()));

    let mut registry = ConnectorRegistry::new();
    registry.register(Backend::Relational, relational.clone());
    registry.register(Backend::KeyValue, keyvalue.clone());
    registry.register(Backend::Graph, graph.clone());

    let mut catalogue = Catalogue::with_defaults();
    catalogue
        .insert("customer", Backend::KeyValue, "id")
        .expect("valid entry");

    Harness {
        client: PolyClient::with_registry(catalogue, registry),
        relational,
        keyvalue,
        graph,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 内存键值会话
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MemoryKvSession {
    strings: Mutex<HashMap<String, String>>,
    hashes: Mutex<HashMap<String, HashMap<String, String>>>,
    documents: Mutex<HashMap<String, Value>>,
    /// 每页最多返回的键数, 0 表示一页扫完
    pub page_limit: usize,
}

impl MemoryKvSession {
    pub fn with_page_limit(page_limit: usize) -> Self {
        Self {
            page_limit,
            ..Default::default()
        }
    }

    fn all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .strings
            .lock()
            .keys()
            .chain(self.hashes.lock().keys())
            .chain(self.documents.lock().keys())
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

#[async_trait]
impl KvSession for MemoryKvSession {
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.strings.lock().get(key).cloned())
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.strings.lock().insert(key.into(), value.into());
        Ok(())
    }

    async fn get_hash(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self.hashes.lock().get(key).cloned().unwrap_or_default())
    }

    async fn set_hash(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        let mut hashes = self.hashes.lock();
        let entry = hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            entry.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn get_document(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.documents.lock().get(key).cloned())
    }

    async fn set_document(&self, key: &str, value: &Value) -> Result<()> {
        self.documents.lock().insert(key.into(), value.clone());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.strings.lock().contains_key(key)
            || self.hashes.lock().contains_key(key)
            || self.documents.lock().contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let a = self.strings.lock().remove(key).is_some();
        let b = self.hashes.lock().remove(key).is_some();
        let c = self.documents.lock().remove(key).is_some();
        Ok((a || b || c) as u64)
    }

    async fn scan_page(
        &self,
        cursor: u64,
        pattern: &str,
        _page_size: usize,
    ) -> Result<(u64, Vec<String>)> {
        let prefix = pattern.trim_end_matches('*');
        let matched: Vec<String> = self
            .all_keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        let limit = if self.page_limit == 0 {
            matched.len().max(1)
        } else {
            self.page_limit
        };
        let start = cursor as usize;
        let page: Vec<String> = matched.iter().skip(start).take(limit).cloned().collect();
        let next = start + page.len();
        let next_cursor = if next >= matched.len() { 0 } else { next as u64 };
        Ok((next_cursor, page))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 脚本化 SQL 会话
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct ScriptedSqlSession {
    pub calls: Mutex<Vec<(String, Vec<SqlParam>)>>,
    json_results: Mutex<VecDeque<Vec<Value>>>,
    execute_results: Mutex<VecDeque<u64>>,
    scalar_results: Mutex<VecDeque<i64>>,
}

impl ScriptedSqlSession {
    pub fn push_rows(&self, rows: Vec<Value>) {
        self.json_results.lock().push_back(rows);
    }

    pub fn push_execute(&self, n: u64) {
        self.execute_results.lock().push_back(n);
    }

    pub fn push_scalar(&self, n: i64) {
        self.scalar_results.lock().push_back(n);
    }

    pub fn recorded_sql(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(sql, _)| sql.clone()).collect()
    }
}

#[async_trait]
impl SqlSession for ScriptedSqlSession {
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }

    async fn query_json(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Value>> {
        self.calls.lock().push((sql.to_string(), params.to_vec()));
        Ok(self.json_results.lock().pop_front().unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64> {
        self.calls.lock().push((sql.to_string(), params.to_vec()));
        Ok(self.execute_results.lock().pop_front().unwrap_or(0))
    }

    async fn query_scalar(&self, sql: &str) -> Result<i64> {
        self.calls.lock().push((sql.to_string(), Vec::new()));
        Ok(self.scalar_results.lock().pop_front().unwrap_or(0))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 脚本化图会话
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct ScriptedGraphSession {
    pub calls: Mutex<Vec<(String, Vec<(String, Value)>)>>,
    map_results: Mutex<VecDeque<Option<serde_json::Map<String, Value>>>>,
    count_results: Mutex<VecDeque<i64>>,
}

impl ScriptedGraphSession {
    pub fn push_map(&self, map: Option<serde_json::Map<String, Value>>) {
        self.map_results.lock().push_back(map);
    }

    pub fn push_count(&self, n: i64) {
        self.count_results.lock().push_back(n);
    }

    pub fn recorded_cypher(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(c, _)| c.clone()).collect()
    }
}

#[async_trait]
impl GraphSession for ScriptedGraphSession {
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }

    async fn run(&self, cypher: &str, params: &[(String, Value)]) -> Result<()> {
        self.calls.lock().push((cypher.to_string(), params.to_vec()));
        Ok(())
    }

    async fn fetch_one_map(
        &self,
        cypher: &str,
        params: &[(String, Value)],
        _alias: &str,
    ) -> Result<Option<serde_json::Map<String, Value>>> {
        self.calls.lock().push((cypher.to_string(), params.to_vec()));
        Ok(self.map_results.lock().pop_front().flatten())
    }

    async fn fetch_count(
        &self,
        cypher: &str,
        params: &[(String, Value)],
        _alias: &str,
    ) -> Result<i64> {
        self.calls.lock().push((cypher.to_string(), params.to_vec()));
        Ok(self.count_results.lock().pop_front().unwrap_or(0))
    }
}
