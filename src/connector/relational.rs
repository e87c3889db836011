//! 关系库适配器
//!
//! 实体名直接映射表名; 点查/点更/点删按主键列构造参数化语句;
//! 读路径经 row_to_json 把行折叠成单列 JSON, 键名从 snake_case
//! 归一化为 camelCase; 写路径先把载荷键名转回 snake_case。
//! 标识符一律 snake 化后双引号包裹, 值一律走参数位。

use async_trait::async_trait;
use serde_json::Value;

use crate::connector::{Connector, Record};
use crate::utils::config::RelationalConfig;
use crate::utils::naming::{camelize_map, snakeify, snakeify_map};
use crate::wire::{PgSession, SqlParam, SqlSession};
use crate::{PolyError, Result};

/// snake 化并加引号的 SQL 标识符
fn sql_ident(name: &str) -> String {
    format!("\"{}\"", snakeify(name).replace('"', "\"\""))
}

/// 关系库适配器, 会话类型可替换以便脱机测试
pub struct RelationalConnector<S: SqlSession> {
    session: S,
}

impl RelationalConnector<PgSession> {
    pub fn new(config: RelationalConfig) -> Self {
        Self {
            session: PgSession::new(config),
        }
    }
}

impl<S: SqlSession> RelationalConnector<S> {
    /// 直接注入会话 (测试与嵌入场景)
    pub fn from_session(session: S) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    fn row_to_record(row: Value) -> Result<Record> {
        match row {
            Value::Object(map) => Ok(camelize_map(map)),
            other => Err(PolyError::StoreError(format!(
                "relational row is not a JSON object: {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl<S: SqlSession> Connector for RelationalConnector<S> {
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
        let sql = format!("SELECT COUNT(*) FROM {}", sql_ident(entity));
        log::debug!("relational count: {}", sql);
        self.session.query_scalar(&sql).await
    }

    async fn get(
        &self,
        entity: &str,
        pk_field: &str,
        pk_value: &Value,
    ) -> Result<Option<Record>> {
        let sql = format!(
            "SELECT row_to_json(t) FROM {} t WHERE {} = $1",
            sql_ident(entity),
            sql_ident(pk_field)
        );
        let params = [SqlParam::from_json(pk_value)];
        log::debug!("relational get: {} [{}]", sql, params[0]);
        let rows = self.session.query_json(&sql, &params).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(Self::row_to_record(row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, entity: &str, payload: Record) -> Result<Record> {
        if payload.is_empty() {
            return Err(PolyError::InvalidParameter(
                "insert payload is empty".to_string(),
            ));
        }
        let snake = snakeify_map(payload);
        let columns: Vec<String> = snake.keys().map(|k| sql_ident(k)).collect();
        let placeholders: Vec<String> = (1..=snake.len()).map(|i| format!("${}", i)).collect();
        let params: Vec<SqlParam> = snake.values().map(SqlParam::from_json).collect();
        let sql = format!(
            "INSERT INTO {} AS t ({}) VALUES ({}) RETURNING row_to_json(t)",
            sql_ident(entity),
            columns.join(", "),
            placeholders.join(", ")
        );
        log::debug!("relational insert: {}", sql);
        let rows = self.session.query_json(&sql, &params).await?;
        match rows.into_iter().next() {
            Some(row) => Self::row_to_record(row),
            None => Err(PolyError::StoreError(
                "insert returned no row".to_string(),
            )),
        }
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
        let snake = snakeify_map(payload);
        let assignments: Vec<String> = snake
            .keys()
            .enumerate()
            .map(|(i, k)| format!("{} = ${}", sql_ident(k), i + 1))
            .collect();
        let mut params: Vec<SqlParam> = snake.values().map(SqlParam::from_json).collect();
        params.push(SqlParam::from_json(pk_value));
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            sql_ident(entity),
            assignments.join(", "),
            sql_ident(pk_field),
            params.len()
        );
        log::debug!("relational update: {}", sql);
        self.session.execute(&sql, &params).await
    }

    async fn delete(&self, entity: &str, pk_field: &str, pk_value: &Value) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            sql_ident(entity),
            sql_ident(pk_field)
        );
        let params = [SqlParam::from_json(pk_value)];
        log::debug!("relational delete: {} [{}]", sql, params[0]);
        self.session.execute(&sql, &params).await
    }

    async fn raw_query(&self, native: &str) -> Result<Vec<Record>> {
        let inner = native.trim().trim_end_matches(';');
        let sql = format!("SELECT row_to_json(q) FROM ({}) q", inner);
        log::debug!("relational raw query: {}", sql);
        let rows = self.session.query_json(&sql, &[]).await?;
        rows.into_iter().map(Self::row_to_record).collect()
    }
}
