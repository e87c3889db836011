//! 图库适配器
//!
//! 实体名映射节点标签 (首字母大写)。点查按 标签+主键属性 匹配取属性表;
//! insert 建节点; update 把载荷属性合并到既有节点 (未提及属性保留);
//! delete 先解边再删点。update/delete 的 Cypher 末尾追加
//! `RETURN count(n) AS n`, 返回的是真实命中数。
//! 主键属性名永远由调用方显式给出, 这里不做任何候选名猜测。

use async_trait::async_trait;
use serde_json::Value;

use crate::connector::{Connector, Record};
use crate::utils::config::GraphConfig;
use crate::utils::naming::camelize_map;
use crate::wire::{GraphSession, Neo4jSession};
use crate::{PolyError, Result};

/// 实体名 → 节点标签 (首字母大写, 反引号包裹)
fn label(entity: &str) -> String {
    let mut chars = entity.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

/// 属性名包上反引号, 内嵌反引号剔除
fn prop_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', ""))
}

/// 图库适配器
pub struct GraphConnector<S: GraphSession> {
    session: S,
}

impl GraphConnector<Neo4jSession> {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            session: Neo4jSession::new(config),
        }
    }
}

impl<S: GraphSession> GraphConnector<S> {
    /// 直接注入会话 (测试与嵌入场景)
    pub fn from_session(session: S) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

#[async_trait]
impl<S: GraphSession> Connector for GraphConnector<S> {
    async fn connect(&self) -> Result<()> {
        self.session.connect().await
    }

    async fn disconnect(&self) -> Result<()> {
        self.session.disconnect().await
    }

    async fn ping(&self) -> Result<bool> {
        self.session.ping().await
    }

    async fn count(&self, entity: &str) -> Result<i64> {
        let cypher = format!("MATCH (n:{}) RETURN count(n) AS n", prop_ident(&label(entity)));
        log::debug!("graph count: {}", cypher);
        self.session.fetch_count(&cypher, &[], "n").await
    }

    async fn get(
        &self,
        entity: &str,
        pk_field: &str,
        pk_value: &Value,
    ) -> Result<Option<Record>> {
        let cypher = format!(
            "MATCH (n:{}) WHERE n.{} = $pk_val RETURN properties(n) AS p LIMIT 1",
            prop_ident(&label(entity)),
            prop_ident(pk_field)
        );
        let params = [("pk_val".to_string(), pk_value.clone())];
        log::debug!("graph get: {}", cypher);
        let props = self.session.fetch_one_map(&cypher, &params, "p").await?;
        Ok(props.map(camelize_map))
    }

    async fn insert(&self, entity: &str, payload: Record) -> Result<Record> {
        if payload.is_empty() {
            return Err(PolyError::InvalidParameter(
                "insert payload is empty".to_string(),
            ));
        }
        let props: Vec<String> = payload
            .keys()
            .enumerate()
            .map(|(i, k)| format!("{}: $p{}", prop_ident(k), i))
            .collect();
        let params: Vec<(String, Value)> = payload
            .values()
            .enumerate()
            .map(|(i, v)| (format!("p{}", i), v.clone()))
            .collect();
        let cypher = format!(
            "CREATE (n:{} {{ {} }}) RETURN properties(n) AS p",
            prop_ident(&label(entity)),
            props.join(", ")
        );
        log::debug!("graph insert: {}", cypher);
        let props = self.session.fetch_one_map(&cypher, &params, "p").await?;
        props.map(camelize_map).ok_or_else(|| {
            PolyError::StoreError("node creation returned no properties".to_string())
        })
    }

    async fn update(
        &self,
        entity: &str,
        pk_field: &str,
        pk_value: &Value,
        payload: Record,
    ) -> Result<u64> {
        if payload.is_empty() {
            return Err(PolyError::InvalidParameter(
                "update payload is empty".to_string(),
            ));
        }
        let assignments: Vec<String> = payload
            .keys()
            .enumerate()
            .map(|(i, k)| format!("n.{} = $p{}", prop_ident(k), i))
            .collect();
        let mut params: Vec<(String, Value)> = payload
            .values()
            .enumerate()
            .map(|(i, v)| (format!("p{}", i), v.clone()))
            .collect();
        params.push(("pk_val".to_string(), pk_value.clone()));
        let cypher = format!(
            "MATCH (n:{} {{{}: $pk_val}}) SET {} RETURN count(n) AS n",
            prop_ident(&label(entity)),
            prop_ident(pk_field),
            assignments.join(", ")
        );
        log::debug!("graph update: {}", cypher);
        let matched = self.session.fetch_count(&cypher, &params, "n").await?;
        Ok(matched.max(0) as u64)
    }

    async fn delete(&self, entity: &str, pk_field: &str, pk_value: &Value) -> Result<u64> {
        let cypher = format!(
            "MATCH (n:{} {{{}: $pk_val}}) DETACH DELETE n RETURN count(n) AS n",
            prop_ident(&label(entity)),
            prop_ident(pk_field)
        );
        let params = [("pk_val".to_string(), pk_value.clone())];
        log::debug!("graph delete: {}", cypher);
        let matched = self.session.fetch_count(&cypher, &params, "n").await?;
        Ok(matched.max(0) as u64)
    }

    async fn raw_query(&self, _native: &str) -> Result<Vec<Record>> {
        Err(PolyError::UnsupportedQuery(
            "graph backend does not accept raw queries".to_string(),
        ))
    }
}
