//! 键值库适配器
//!
//! 实体名是键名空间前缀, 物理键为 `{entity}:{pk}`。值编码由配置决定:
//! string 整条 JSON 串 / hash 字段打散 / document 结构化文档,
//! 未识别的编码在构造期即被拒绝。count 走游标翻页扫描, 逐页累加,
//! 不假设结果集有界。

use async_trait::async_trait;
use serde_json::Value;

use crate::connector::{Connector, KvEncoding, Record};
use crate::utils::config::KeyValueConfig;
use crate::utils::naming::camelize_map;
use crate::wire::{KvSession, RedisSession};
use crate::{PolyError, Result};

/// 每页扫描的键数量
const SCAN_PAGE_SIZE: usize = 1000;

/// 主键值 → 键尾段文本 (字符串不带引号)
fn key_segment(pk_value: &Value) -> String {
    match pk_value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// hash 编码下单个字段值的存储文本
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 键值库适配器
pub struct KeyValueConnector<S: KvSession> {
    session: S,
    encoding: KvEncoding,
    /// insert 从载荷里取键尾段所用的主键字段
    default_pk: String,
}

impl KeyValueConnector<RedisSession> {
    /// 编码选择器不认识时在这里报 UnsupportedEncoding, 不会带病上线
    pub fn new(config: KeyValueConfig) -> Result<Self> {
        let encoding: KvEncoding = config.data_type.parse()?;
        let default_pk = config.pk_field.clone();
        Ok(Self {
            session: RedisSession::new(config),
            encoding,
            default_pk,
        })
    }
}

impl<S: KvSession> KeyValueConnector<S> {
    /// 直接注入会话 (测试与嵌入场景)
    pub fn from_session(session: S, encoding: KvEncoding, default_pk: &str) -> Self {
        Self {
            session,
            encoding,
            default_pk: default_pk.to_string(),
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    fn physical_key(entity: &str, pk_value: &Value) -> String {
        format!("{}:{}", entity, key_segment(pk_value))
    }

    /// 按编码读一条记录
    async fn read_record(&self, key: &str) -> Result<Option<Record>> {
        match self.encoding {
            KvEncoding::String => {
                let Some(raw) = self.session.get_string(key).await? else {
                    return Ok(None);
                };
                let value: Value = serde_json::from_str(&raw).map_err(|e| {
                    PolyError::StoreError(format!("invalid JSON blob at {}: {}", key, e))
                })?;
                match value {
                    Value::Object(map) => Ok(Some(camelize_map(map))),
                    other => Err(PolyError::StoreError(format!(
                        "value at {} is not a JSON object: {}",
                        key, other
                    ))),
                }
            }
            KvEncoding::Hash => {
                let fields = self.session.get_hash(key).await?;
                if fields.is_empty() {
                    return Ok(None);
                }
                let map = fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                Ok(Some(camelize_map(map)))
            }
            KvEncoding::Document => {
                let Some(doc) = self.session.get_document(key).await? else {
                    return Ok(None);
                };
                match doc {
                    Value::Object(map) => Ok(Some(camelize_map(map))),
                    other => Err(PolyError::StoreError(format!(
                        "document at {} is not an object: {}",
                        key, other
                    ))),
                }
            }
        }
    }

    /// 按编码写一条记录, 返回与存储形态一致的回显
    async fn write_record(&self, key: &str, payload: Record) -> Result<Record> {
        match self.encoding {
            KvEncoding::String => {
                let blob = serde_json::to_string(&Value::Object(payload.clone()))
                    .map_err(|e| PolyError::StoreError(format!("serialization failed: {}", e)))?;
                self.session.set_string(key, &blob).await?;
                Ok(camelize_map(payload))
            }
            KvEncoding::Hash => {
                let fields: Vec<(String, String)> = payload
                    .iter()
                    .map(|(k, v)| (k.clone(), field_text(v)))
                    .collect();
                self.session.set_hash(key, &fields).await?;
                // hash 存储的是字段文本, 回显保持同样形态
                let stored = fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                Ok(camelize_map(stored))
            }
            KvEncoding::Document => {
                self.session
                    .set_document(key, &Value::Object(payload.clone()))
                    .await?;
                Ok(camelize_map(payload))
            }
        }
    }
}

#[async_trait]
impl<S: KvSession> Connector for KeyValueConnector<S> {
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
        let pattern = format!("{}:*", entity);
        let mut total: i64 = 0;
        let mut cursor: u64 = 0;
        loop {
            let (next, keys) = self
                .session
                .scan_page(cursor, &pattern, SCAN_PAGE_SIZE)
                .await?;
            total += keys.len() as i64;
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        log::debug!("keyvalue count {}: {}", pattern, total);
        Ok(total)
    }

    async fn get(
        &self,
        entity: &str,
        _pk_field: &str,
        pk_value: &Value,
    ) -> Result<Option<Record>> {
        let key = Self::physical_key(entity, pk_value);
        log::debug!("keyvalue get: {}", key);
        self.read_record(&key).await
    }

    async fn insert(&self, entity: &str, payload: Record) -> Result<Record> {
        let pk_value = payload.get(&self.default_pk).ok_or_else(|| {
            PolyError::InvalidParameter(format!(
                "primary key '{}' not found in payload",
                self.default_pk
            ))
        })?;
        let key = Self::physical_key(entity, pk_value);
        log::debug!("keyvalue insert: {}", key);
        self.write_record(&key, payload).await
    }

    async fn update(
        &self,
        entity: &str,
        _pk_field: &str,
        pk_value: &Value,
        payload: Record,
    ) -> Result<u64> {
        let key = Self::physical_key(entity, pk_value);
        match self.encoding {
            // hash 字段天然可合并, 只需确认记录存在
            KvEncoding::Hash => {
                if !self.session.exists(&key).await? {
                    return Ok(0);
                }
                let fields: Vec<(String, String)> = payload
                    .iter()
                    .map(|(k, v)| (k.clone(), field_text(v)))
                    .collect();
                self.session.set_hash(&key, &fields).await?;
                Ok(1)
            }
            // 整条编码要读回合并再写
            KvEncoding::String | KvEncoding::Document => {
                let Some(mut current) = self.read_record(&key).await? else {
                    return Ok(0);
                };
                for (k, v) in payload {
                    current.insert(k, v);
                }
                self.write_record(&key, current).await?;
                Ok(1)
            }
        }
    }

    async fn delete(&self, entity: &str, _pk_field: &str, pk_value: &Value) -> Result<u64> {
        let key = Self::physical_key(entity, pk_value);
        log::debug!("keyvalue delete: {}", key);
        self.session.delete(&key).await
    }

    async fn raw_query(&self, _native: &str) -> Result<Vec<Record>> {
        Err(PolyError::UnsupportedQuery(
            "key-value backend does not accept raw queries".to_string(),
        ))
    }
}
