//! 图库会话 - neo4rs 封装
//!
//! Bolt 驱动之上的最小封装: 无返回执行 / 单映射列读取 / 单整数列读取。
//! 驱动不暴露变更计数器, 适配器通过在 Cypher 尾部追加
//! `RETURN count(n) AS n` 读回真实命中数。

use std::sync::Arc;

use async_trait::async_trait;
use neo4rs::{BoltType, Graph, Query};
use parking_lot::RwLock;
use serde_json::Value;

use crate::utils::config::GraphConfig;
use crate::wire::GraphSession;
use crate::{PolyError, Result};

/// Bolt 值 → JSON 值
fn bolt_to_json(bolt: BoltType) -> Value {
    match bolt {
        BoltType::Null(_) => Value::Null,
        BoltType::Boolean(b) => Value::Bool(b.value),
        BoltType::Integer(i) => Value::Number(i.value.into()),
        BoltType::Float(f) => serde_json::Number::from_f64(f.value)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        BoltType::String(s) => Value::String(s.value),
        BoltType::List(list) => Value::Array(list.value.into_iter().map(bolt_to_json).collect()),
        BoltType::Map(map) => Value::Object(
            map.value
                .into_iter()
                .map(|(k, v)| (k.value, bolt_to_json(v)))
                .collect(),
        ),
        other => Value::String(format!("{:?}", other)),
    }
}

/// 参数逐个挂到 Query 上, 标量直传, 其余降级为 JSON 文本
fn build_query(cypher: &str, params: &[(String, Value)]) -> Query {
    let mut query = neo4rs::query(cypher);
    for (key, value) in params {
        query = match value {
            Value::String(s) => query.param(key.as_str(), s.as_str()),
            Value::Bool(b) => query.param(key.as_str(), *b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.param(key.as_str(), i),
                None => query.param(key.as_str(), n.as_f64().unwrap_or(0.0)),
            },
            other => query.param(key.as_str(), other.to_string()),
        };
    }
    query
}

/// Neo4j 会话
pub struct Neo4jSession {
    config: GraphConfig,
    graph: RwLock<Option<Arc<Graph>>>,
}

impl Neo4jSession {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            graph: RwLock::new(None),
        }
    }

    fn graph(&self) -> Result<Arc<Graph>> {
        self.graph
            .read()
            .clone()
            .ok_or(PolyError::NotConnected("graph"))
    }
}

#[async_trait]
impl GraphSession for Neo4jSession {
    async fn connect(&self) -> Result<()> {
        if self.graph.read().is_some() {
            return Ok(());
        }
        let graph =
            Graph::new(&self.config.uri(), &self.config.user, &self.config.password).await?;
        *self.graph.write() = Some(Arc::new(graph));
        log::info!("neo4j session established ({})", self.config.uri());
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.graph.write().take().is_some() {
            log::info!("neo4j session closed");
        }
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        Ok(self.fetch_count("RETURN 1 AS n", &[], "n").await? == 1)
    }

    async fn run(&self, cypher: &str, params: &[(String, Value)]) -> Result<()> {
        let graph = self.graph()?;
        graph.run(build_query(cypher, params)).await?;
        Ok(())
    }

    async fn fetch_one_map(
        &self,
        cypher: &str,
        params: &[(String, Value)],
        alias: &str,
    ) -> Result<Option<serde_json::Map<String, Value>>> {
        let graph = self.graph()?;
        let mut stream = graph.execute(build_query(cypher, params)).await?;
        let Some(row) = stream.next().await? else {
            return Ok(None);
        };
        let bolt: BoltType = row.get(alias).map_err(|_| {
            PolyError::StoreError(format!("graph result missing alias '{}'", alias))
        })?;
        match bolt_to_json(bolt) {
            Value::Object(map) => Ok(Some(map)),
            Value::Null => Ok(None),
            other => Err(PolyError::StoreError(format!(
                "graph result for '{}' is not a property map: {}",
                alias, other
            ))),
        }
    }

    async fn fetch_count(
        &self,
        cypher: &str,
        params: &[(String, Value)],
        alias: &str,
    ) -> Result<i64> {
        let graph = self.graph()?;
        let mut stream = graph.execute(build_query(cypher, params)).await?;
        let Some(row) = stream.next().await? else {
            return Ok(0);
        };
        row.get::<i64>(alias).map_err(|_| {
            PolyError::StoreError(format!("graph result missing count alias '{}'", alias))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_connected() {
        let session = Neo4jSession::new(GraphConfig::default());
        let err = tokio_test::block_on(session.run("RETURN 1", &[])).unwrap_err();
        assert!(matches!(err, PolyError::NotConnected("graph")));
    }

    #[test]
    fn test_bolt_scalar_conversion() {
        use neo4rs::{BoltBoolean, BoltInteger, BoltString};

        assert_eq!(
            bolt_to_json(BoltType::String(BoltString::from("Acme"))),
            json!("Acme")
        );
        assert_eq!(
            bolt_to_json(BoltType::Integer(BoltInteger::new(7))),
            json!(7)
        );
        assert_eq!(
            bolt_to_json(BoltType::Boolean(BoltBoolean::new(true))),
            json!(true)
        );
    }
}
