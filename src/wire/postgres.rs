//! 关系库会话 - tokio-postgres 封装
//!
//! 单一共享连接; 变更走 execute, 点查走 row_to_json 单列 JSON 投影,
//! 行结构因此不需要逐列类型映射。

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

use crate::utils::config::RelationalConfig;
use crate::wire::{SqlParam, SqlSession};
use crate::{PolyError, Result};

static NULL_PARAM: Option<String> = None;

/// SqlParam → tokio-postgres 参数
fn pg_param(param: &SqlParam) -> &(dyn ToSql + Sync) {
    match param {
        SqlParam::Text(s) => s,
        SqlParam::Int(i) => i,
        SqlParam::Float(f) => f,
        SqlParam::Bool(b) => b,
        SqlParam::Null => &NULL_PARAM,
    }
}

/// PostgreSQL 会话
pub struct PgSession {
    config: RelationalConfig,
    client: RwLock<Option<Arc<Client>>>,
}

impl PgSession {
    pub fn new(config: RelationalConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
        }
    }

    /// 取共享连接; 锁不跨 await 持有, 先克隆再用
    fn client(&self) -> Result<Arc<Client>> {
        self.client
            .read()
            .clone()
            .ok_or(PolyError::NotConnected("relational"))
    }
}

#[async_trait]
impl SqlSession for PgSession {
    async fn connect(&self) -> Result<()> {
        if self.client.read().is_some() {
            return Ok(());
        }
        let (client, connection) =
            tokio_postgres::connect(&self.config.conn_string(), NoTls).await?;
        // 驱动任务: 连接关闭时自行退出
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("postgres connection error: {}", e);
            }
        });
        *self.client.write() = Some(Arc::new(client));
        log::info!(
            "postgres session established ({}:{})",
            self.config.host,
            self.config.port
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.client.write().take().is_some() {
            log::info!("postgres session closed");
        }
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        Ok(self.query_scalar("SELECT 1").await? == 1)
    }

    async fn query_json(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Value>> {
        let client = self.client()?;
        let pg_params: Vec<&(dyn ToSql + Sync)> = params.iter().map(pg_param).collect();
        let rows = client.query(sql, &pg_params).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(row.try_get::<_, Value>(0)?);
        }
        Ok(out)
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64> {
        let client = self.client()?;
        let pg_params: Vec<&(dyn ToSql + Sync)> = params.iter().map(pg_param).collect();
        Ok(client.execute(sql, &pg_params).await?)
    }

    async fn query_scalar(&self, sql: &str) -> Result<i64> {
        let client = self.client()?;
        let row = client.query_one(sql, &[]).await?;
        Ok(row.try_get::<_, i64>(0)?)
    }
}
