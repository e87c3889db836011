//! 路由门面
//!
//! 对外统一入口: 接一条 SQL (或 get/count 点操作), 经目录解析或显式
//! 后端覆盖确定落点, 分发到对应策略与连接器, 返回归一化结果。
//! 门面独占持有目录与连接器注册表; 连接的建立与释放在三个后端间
//! 并发进行, 某个建连失败时尽力释放其余已开会话。

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::catalogue::Catalogue;
use crate::connector::{
    Backend, ConnectorRegistry, GraphConnector, KeyValueConnector, Record, RelationalConnector,
};
use crate::parser;
use crate::strategy::{strategy_for, QueryOutput, StrategyContext};
use crate::utils::config::PolyConfig;
use crate::{PolyError, Result};

/// 点操作的主键值: 纯数字文本按整数处理, 其余原样作字符串
fn coerce_pk(pk: &str) -> Value {
    if !pk.is_empty() && pk.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(i) = pk.parse::<i64>() {
            return Value::Number(i.into());
        }
    }
    Value::String(pk.to_string())
}

/// 多模路由客户端
pub struct PolyClient {
    catalogue: Catalogue,
    registry: ConnectorRegistry,
}

impl PolyClient {
    /// 按配置构造: 三个后端各注册一个连接器, 目录载入内置缺省并
    /// 叠加覆盖文件 (如果配置了)
    pub fn new(config: PolyConfig) -> Result<Self> {
        let mut catalogue = Catalogue::with_defaults();
        if let Some(path) = &config.catalogue_file {
            catalogue.load_overlay(path)?;
        }

        let mut registry = ConnectorRegistry::new();
        registry.register(
            Backend::Relational,
            Arc::new(RelationalConnector::new(config.relational.clone())),
        );
        registry.register(
            Backend::KeyValue,
            Arc::new(KeyValueConnector::new(config.keyvalue.clone())?),
        );
        registry.register(
            Backend::Graph,
            Arc::new(GraphConnector::new(config.graph.clone())),
        );

        Ok(Self {
            catalogue,
            registry,
        })
    }

    /// 注入现成的目录与注册表 (测试与嵌入场景)
    pub fn with_registry(catalogue: Catalogue, registry: ConnectorRegistry) -> Self {
        Self {
            catalogue,
            registry,
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }

    // ═══════════════════════════════════════════════════════════════════════
    // 会话生命周期
    // ═══════════════════════════════════════════════════════════════════════

    /// 并发建立全部后端会话
    ///
    /// 任一建连失败时, 先尽力释放已开的会话, 再返回第一个错误。
    pub async fn connect_all(&self) -> Result<()> {
        let tasks: Vec<_> = self
            .registry
            .iter()
            .map(|(backend, connector)| {
                let backend = *backend;
                let connector = connector.clone();
                async move { (backend, connector.connect().await) }
            })
            .collect();

        let mut first_err = None;
        for (backend, result) in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                log::error!("connect failed for {}: {}", backend, e);
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        if let Some(e) = first_err {
            self.disconnect_all().await;
            return Err(e);
        }
        log::info!("all {} connectors ready", self.registry.len());
        Ok(())
    }

    /// 并发释放全部后端会话, 单个失败只记日志不上抛
    pub async fn disconnect_all(&self) {
        let tasks: Vec<_> = self
            .registry
            .iter()
            .map(|(backend, connector)| {
                let backend = *backend;
                let connector = connector.clone();
                async move { (backend, connector.disconnect().await) }
            })
            .collect();

        for (backend, result) in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                log::warn!("disconnect failed for {}: {}", backend, e);
            }
        }
    }

    /// 并发探活全部后端, 返回各后端健康状态
    pub async fn ping_all(&self) -> HashMap<Backend, bool> {
        let tasks: Vec<_> = self
            .registry
            .iter()
            .map(|(backend, connector)| {
                let backend = *backend;
                let connector = connector.clone();
                async move { (backend, connector.ping().await) }
            })
            .collect();

        let mut health = HashMap::new();
        for (backend, result) in futures::future::join_all(tasks).await {
            let alive = match result {
                Ok(alive) => alive,
                Err(e) => {
                    log::warn!("ping failed for {}: {}", backend, e);
                    false
                }
            };
            health.insert(backend, alive);
        }
        health
    }

    // ═══════════════════════════════════════════════════════════════════════
    // 查询入口
    // ═══════════════════════════════════════════════════════════════════════

    /// 执行一条受限 SQL
    ///
    /// `engine` 显式指定落点后端, `use_catalogue` 启用目录解析;
    /// 两者都缺时无法确定落点, 报 `AmbiguousTarget`;
    /// 两者都给且不一致时报 `ConflictingTarget`。
    pub async fn execute(
        &self,
        sql: &str,
        engine: Option<Backend>,
        use_catalogue: bool,
    ) -> Result<QueryOutput> {
        if engine.is_none() && !use_catalogue {
            return Err(PolyError::AmbiguousTarget);
        }
        let statement = parser::parse(sql)?;
        let (backend, pk_field) = self.resolve_target(&statement.table, engine, use_catalogue)?;
        log::info!(
            "execute: {} {} via {} ({})",
            statement.kind,
            statement.table,
            backend,
            if pk_field.is_some() {
                "catalogue"
            } else {
                "override"
            }
        );

        let strategy = strategy_for(statement.kind);
        strategy
            .execute(StrategyContext {
                statement: &statement,
                backend,
                pk_field: pk_field.as_deref(),
                registry: &self.registry,
            })
            .await
    }

    /// 按主键取一条记录
    ///
    /// 主键字段名永远来自目录; `engine` 只改写落点后端, 不在目录里的
    /// 实体即使带覆盖也报 `UnknownEntity`。
    pub async fn get(
        &self,
        entity: &str,
        pk_value: &str,
        engine: Option<Backend>,
    ) -> Result<Option<Record>> {
        let entry = self.catalogue.resolve(entity)?;
        let backend = engine.unwrap_or(entry.backend);
        let connector = self.registry.require(backend)?;
        connector
            .get(entity, &entry.pk_field, &coerce_pk(pk_value))
            .await
    }

    /// 实体总数; 显式 `engine` 时不经目录直接点名后端
    pub async fn count(&self, entity: &str, engine: Option<Backend>) -> Result<i64> {
        let backend = match engine {
            Some(backend) => backend,
            None => self.catalogue.resolve(entity)?.backend,
        };
        self.registry.require(backend)?.count(entity).await
    }

    /// 目标后端与主键解析
    ///
    /// 返回 (后端, 目录主键); 主键为 None 表示显式覆盖路径。
    fn resolve_target(
        &self,
        table: &str,
        engine: Option<Backend>,
        use_catalogue: bool,
    ) -> Result<(Backend, Option<String>)> {
        if use_catalogue {
            let entry = self.catalogue.resolve(table)?;
            if let Some(requested) = engine {
                if requested != entry.backend {
                    return Err(PolyError::ConflictingTarget {
                        entity: table.to_string(),
                        requested: requested.to_string(),
                        catalogued: entry.backend.to_string(),
                    });
                }
            }
            Ok((entry.backend, Some(entry.pk_field.clone())))
        } else {
            engine
                .map(|backend| (backend, None))
                .ok_or(PolyError::AmbiguousTarget)
        }
    }
}
