//! 键值库会话 - redis 封装
//!
//! 单一多路复用连接, 按值克隆句柄使用。三种值编码 (string/hash/document)
//! 的原语在这里一一对应到 GET/SET, HGETALL/HSET, JSON.GET/JSON.SET;
//! count 所需的游标翻页对应 SCAN。

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use redis::aio::MultiplexedConnection;
use serde_json::Value;

use crate::utils::config::KeyValueConfig;
use crate::wire::KvSession;
use crate::{PolyError, Result};

/// Redis 会话
pub struct RedisSession {
    config: KeyValueConfig,
    conn: RwLock<Option<MultiplexedConnection>>,
}

impl RedisSession {
    pub fn new(config: KeyValueConfig) -> Self {
        Self {
            config,
            conn: RwLock::new(None),
        }
    }

    /// 取连接句柄 (克隆开销极小); 锁不跨 await 持有
    fn conn(&self) -> Result<MultiplexedConnection> {
        self.conn
            .read()
            .clone()
            .ok_or(PolyError::NotConnected("keyvalue"))
    }
}

#[async_trait]
impl KvSession for RedisSession {
    async fn connect(&self) -> Result<()> {
        if self.conn.read().is_some() {
            return Ok(());
        }
        let client = redis::Client::open(self.config.url())?;
        let conn = client.get_multiplexed_async_connection().await?;
        *self.conn.write() = Some(conn);
        log::info!(
            "redis session established ({}:{})",
            self.config.host,
            self.config.port
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.conn.write().take().is_some() {
            log::info!("redis session closed");
        }
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        let mut conn = self.conn()?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn()?;
        Ok(redis::cmd("GET").arg(key).query_async(&mut conn).await?)
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn()?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get_hash(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.conn()?;
        Ok(redis::cmd("HGETALL").arg(key).query_async(&mut conn).await?)
    }

    async fn set_hash(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        let mut conn = self.conn()?;
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn get_document(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.conn()?;
        let raw: Option<String> = redis::cmd("JSON.GET")
            .arg(key)
            .arg("$")
            .query_async(&mut conn)
            .await?;
        let Some(raw) = raw else { return Ok(None) };
        let parsed: Value = serde_json::from_str(&raw)
            .map_err(|e| PolyError::StoreError(format!("invalid JSON document at {}: {}", key, e)))?;
        // 路径 $ 返回单元素数组
        match parsed {
            Value::Array(mut items) if !items.is_empty() => Ok(Some(items.remove(0))),
            Value::Array(_) => Ok(None),
            other => Ok(Some(other)),
        }
    }

    async fn set_document(&self, key: &str, value: &Value) -> Result<()> {
        let mut conn = self.conn()?;
        let doc = serde_json::to_string(value)
            .map_err(|e| PolyError::StoreError(format!("document serialization failed: {}", e)))?;
        redis::cmd("JSON.SET")
            .arg(key)
            .arg("$")
            .arg(doc)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let n: u64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(n > 0)
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn()?;
        Ok(redis::cmd("DEL").arg(key).query_async(&mut conn).await?)
    }

    async fn scan_page(
        &self,
        cursor: u64,
        pattern: &str,
        page_size: usize,
    ) -> Result<(u64, Vec<String>)> {
        let mut conn = self.conn()?;
        Ok(redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(page_size)
            .query_async(&mut conn)
            .await?)
    }
}
