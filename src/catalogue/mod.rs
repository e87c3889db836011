//! 逻辑实体目录
//!
//! 逻辑实体名 (小写) → (后端, 主键字段)。内置一份缺省映射, 可被外部
//! JSON 覆盖文件按条目叠加 (同名后写覆盖先写, 而非整表替换)。
//! 门面构造时填充完毕, 之后只读。

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::connector::Backend;
use crate::{PolyError, Result};

/// 目录条目: 实体归属的后端与声明主键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub backend: Backend,
    pub pk_field: String,
}

/// 内置缺省映射
static DEFAULT_MAPPING: Lazy<HashMap<String, CatalogueEntry>> = Lazy::new(|| {
    let defaults = [
        ("customers", Backend::KeyValue, "customerId"),
        ("products", Backend::Relational, "productId"),
        ("customer", Backend::Graph, "customerId"),
        ("person", Backend::Graph, "id"),
    ];
    defaults
        .iter()
        .map(|(name, backend, pk)| {
            (
                name.to_string(),
                CatalogueEntry {
                    backend: *backend,
                    pk_field: pk.to_string(),
                },
            )
        })
        .collect()
});

/// 覆盖文件中的单个条目
#[derive(Debug, Deserialize)]
struct OverlayEntry {
    backend: String,
    pk: String,
}

/// 实体目录
#[derive(Debug, Clone)]
pub struct Catalogue {
    entries: HashMap<String, CatalogueEntry>,
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Catalogue {
    /// 空目录 (仅测试与特殊嵌入场景使用)
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// 携带内置缺省映射的目录
    pub fn with_defaults() -> Self {
        Self {
            entries: DEFAULT_MAPPING.clone(),
        }
    }

    /// 解析逻辑实体, 大小写不敏感
    pub fn resolve(&self, logical_name: &str) -> Result<&CatalogueEntry> {
        self.entries
            .get(&logical_name.to_lowercase())
            .ok_or_else(|| PolyError::UnknownEntity(logical_name.to_string()))
    }

    pub fn contains(&self, logical_name: &str) -> bool {
        self.entries.contains_key(&logical_name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 写入一条映射, 实体名落库前统一转小写
    ///
    /// 空主键字段直接拒绝 -- 目录里不允许存在无主键的实体。
    pub fn insert(&mut self, logical_name: &str, backend: Backend, pk_field: &str) -> Result<()> {
        if pk_field.trim().is_empty() {
            return Err(PolyError::ConfigError(format!(
                "catalogue entry '{}' has an empty primary key field",
                logical_name
            )));
        }
        self.entries.insert(
            logical_name.to_lowercase(),
            CatalogueEntry {
                backend,
                pk_field: pk_field.to_string(),
            },
        );
        Ok(())
    }

    /// 叠加外部 JSON 覆盖文件
    ///
    /// 文件形如 `{"orders": {"backend": "postgres", "pk": "orderId"}}`;
    /// 文件不存在不算错误, 直接跳过。
    pub fn load_overlay<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("catalogue overlay {} not present, skipping", path.display());
            return Ok(());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            PolyError::ConfigError(format!(
                "failed to read catalogue overlay {}: {}",
                path.display(),
                e
            ))
        })?;
        let overlay: HashMap<String, OverlayEntry> =
            serde_json::from_str(&content).map_err(|e| {
                PolyError::ConfigError(format!(
                    "failed to parse catalogue overlay {}: {}",
                    path.display(),
                    e
                ))
            })?;
        for (name, entry) in overlay {
            let backend: Backend = entry.backend.parse()?;
            self.insert(&name, backend, &entry.pk)?;
        }
        log::info!(
            "catalogue overlay {} merged, {} entries total",
            path.display(),
            self.entries.len()
        );
        Ok(())
    }
}
