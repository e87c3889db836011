//! 执行策略
//!
//! 每类语句一个策略, 无状态的请求/响应变换: 校验语句形状, 抽取操作
//! 参数, 调用连接器对应操作。策略按闭合的 `StatementKind` 枚举静态
//! 查表选择, 不做运行时类型探测。
//!
//! 主键规则 (全部策略统一): 走目录解析时, 谓词列必须与目录声明的
//! 主键字段大小写不敏感相等, 否则 `PrimaryKeyMismatch`; 显式后端
//! 覆盖时信任调用方, 谓词列即主键。

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::connector::{Backend, ConnectorRegistry, Record};
use crate::parser::{Literal, ParsedStatement, Predicate, StatementKind};
use crate::{PolyError, Result};

/// SELECT 策略
pub mod select;

/// INSERT 策略
pub mod insert;

/// UPDATE 策略
pub mod update;

/// DELETE 策略
pub mod delete;

pub use delete::DeleteStrategy;
pub use insert::InsertStrategy;
pub use select::SelectStrategy;
pub use update::UpdateStrategy;

// ═══════════════════════════════════════════════════════════════════════════
// 执行结果
// ═══════════════════════════════════════════════════════════════════════════

/// 归一化的执行结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QueryOutput {
    /// SELECT: 0 或 1 条记录
    Rows(Vec<Record>),
    /// INSERT: 存储结果回显
    Inserted(Record),
    /// UPDATE: 实际变更条数与落点后端
    #[serde(rename_all = "camelCase")]
    Updated {
        updated_count: u64,
        backend: Backend,
    },
    /// DELETE: 实际删除条数与落点后端
    #[serde(rename_all = "camelCase")]
    Deleted {
        deleted_count: u64,
        backend: Backend,
    },
}

// ═══════════════════════════════════════════════════════════════════════════
// 策略契约与分发
// ═══════════════════════════════════════════════════════════════════════════

/// 单次执行的上下文, 全部按引用借入, 策略不保留任何状态
pub struct StrategyContext<'a> {
    pub statement: &'a ParsedStatement,
    /// 已解析的目标后端
    pub backend: Backend,
    /// Some = 目录解析生效, 携带目录声明的主键字段; None = 显式覆盖
    pub pk_field: Option<&'a str>,
    pub registry: &'a ConnectorRegistry,
}

/// 执行策略契约
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    async fn execute(&self, ctx: StrategyContext<'_>) -> Result<QueryOutput>;
}

/// 语句类型 → 策略 (静态查表)
pub fn strategy_for(kind: StatementKind) -> &'static dyn ExecutionStrategy {
    match kind {
        StatementKind::Select => &SelectStrategy,
        StatementKind::Insert => &InsertStrategy,
        StatementKind::Update => &UpdateStrategy,
        StatementKind::Delete => &DeleteStrategy,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 公共校验与类型化
// ═══════════════════════════════════════════════════════════════════════════

/// 字面量类型化: 字符串原样, 数字先试整数再退浮点
pub(crate) fn literal_value(literal: &Literal) -> Result<Value> {
    match literal {
        Literal::String(s) => Ok(Value::String(s.clone())),
        Literal::Number(raw) => {
            if let Ok(i) = raw.parse::<i64>() {
                return Ok(Value::Number(i.into()));
            }
            let f = raw.parse::<f64>().map_err(|_| {
                PolyError::UnsupportedQuery(format!("non-numeric literal '{}'", raw))
            })?;
            serde_json::Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| {
                    PolyError::UnsupportedQuery(format!("non-finite numeric literal '{}'", raw))
                })
        }
        Literal::Bool(b) => Ok(Value::Bool(*b)),
        Literal::Null => Ok(Value::Null),
    }
}

/// 谓词列的主键校验, 返回后续操作使用的主键字段名
///
/// 目录路径返回目录里的规范名 (而非语句里的写法), 覆盖路径原样信任。
pub(crate) fn resolve_pk_column<'a>(
    table: &str,
    predicate: &'a Predicate,
    pk_field: Option<&'a str>,
) -> Result<&'a str> {
    match pk_field {
        Some(expected) => {
            if !predicate.column.eq_ignore_ascii_case(expected) {
                return Err(PolyError::PrimaryKeyMismatch {
                    table: table.to_string(),
                    expected: expected.to_string(),
                    found: predicate.column.clone(),
                });
            }
            Ok(expected)
        }
        None => Ok(predicate.column.as_str()),
    }
}

/// 取必需的等值谓词
pub(crate) fn require_predicate<'a>(
    statement: &'a ParsedStatement,
    kind: &str,
) -> Result<&'a Predicate> {
    statement.predicate.as_ref().ok_or_else(|| {
        PolyError::UnsupportedQuery(format!(
            "{} requires a WHERE clause on the primary key",
            kind
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value_string_passthrough() {
        let v = literal_value(&Literal::String("ALFKI".into())).unwrap();
        assert_eq!(v, Value::String("ALFKI".into()));
    }

    #[test]
    fn test_literal_value_integer_first() {
        let v = literal_value(&Literal::Number("42".into())).unwrap();
        assert_eq!(v, serde_json::json!(42));
    }

    #[test]
    fn test_literal_value_float_fallback() {
        let v = literal_value(&Literal::Number("19.95".into())).unwrap();
        assert_eq!(v, serde_json::json!(19.95));
    }

    #[test]
    fn test_resolve_pk_column_catalogue_enforces() {
        let pred = Predicate {
            column: "companyName".into(),
            value: Literal::String("X".into()),
        };
        let err = resolve_pk_column("customers", &pred, Some("customerId")).unwrap_err();
        assert!(matches!(err, PolyError::PrimaryKeyMismatch { .. }));
    }

    /// 目录路径大小写不敏感, 返回目录规范名
    #[test]
    fn test_resolve_pk_column_case_insensitive() {
        let pred = Predicate {
            column: "CUSTOMERID".into(),
            value: Literal::String("X".into()),
        };
        let pk = resolve_pk_column("customers", &pred, Some("customerId")).unwrap();
        assert_eq!(pk, "customerId");
    }

    /// 覆盖路径信任调用方给出的谓词列
    #[test]
    fn test_resolve_pk_column_override_trusts_caller() {
        let pred = Predicate {
            column: "companyName".into(),
            value: Literal::String("X".into()),
        };
        let pk = resolve_pk_column("customers", &pred, None).unwrap();
        assert_eq!(pk, "companyName");
    }
}
