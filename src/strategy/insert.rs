//! INSERT 策略
//!
//! 要求显式列清单 + 恰好一行 VALUES, 列值按位置配对成载荷;
//! 多行插入不在支持子集内。

use async_trait::async_trait;

use super::{literal_value, ExecutionStrategy, QueryOutput, StrategyContext};
use crate::connector::Record;
use crate::{PolyError, Result};

pub struct InsertStrategy;

#[async_trait]
impl ExecutionStrategy for InsertStrategy {
    async fn execute(&self, ctx: StrategyContext<'_>) -> Result<QueryOutput> {
        let stmt = ctx.statement;
        if stmt.columns.is_empty() {
            return Err(PolyError::UnsupportedQuery(
                "INSERT requires an explicit column list".to_string(),
            ));
        }
        let row = match stmt.rows.as_slice() {
            [row] => row,
            [] => {
                return Err(PolyError::UnsupportedQuery(
                    "INSERT requires exactly one row of values".to_string(),
                ))
            }
            _ => {
                return Err(PolyError::UnsupportedQuery(
                    "multi-row INSERT is not supported".to_string(),
                ))
            }
        };
        if row.len() != stmt.columns.len() {
            return Err(PolyError::UnsupportedQuery(format!(
                "INSERT column/value count mismatch: {} columns, {} values",
                stmt.columns.len(),
                row.len()
            )));
        }

        let mut payload = Record::new();
        for (column, literal) in stmt.columns.iter().zip(row.iter()) {
            payload.insert(column.clone(), literal_value(literal)?);
        }

        let connector = ctx.registry.require(ctx.backend)?;
        log::debug!(
            "insert: {} on {} ({} fields)",
            stmt.table,
            ctx.backend,
            payload.len()
        );
        let stored = connector.insert(&stmt.table, payload).await?;
        Ok(QueryOutput::Inserted(stored))
    }
}
