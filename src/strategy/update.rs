//! UPDATE 策略
//!
//! 谓词列必须是声明主键 (规则同 SELECT); SET 赋值按书写顺序
//! 构成载荷, 值类型化与 SELECT 相同; 返回实际变更条数与落点后端。

use async_trait::async_trait;

use super::{
    literal_value, require_predicate, resolve_pk_column, ExecutionStrategy, QueryOutput,
    StrategyContext,
};
use crate::connector::Record;
use crate::Result;

pub struct UpdateStrategy;

#[async_trait]
impl ExecutionStrategy for UpdateStrategy {
    async fn execute(&self, ctx: StrategyContext<'_>) -> Result<QueryOutput> {
        let stmt = ctx.statement;
        let predicate = require_predicate(stmt, "UPDATE")?;
        let pk_field = resolve_pk_column(&stmt.table, predicate, ctx.pk_field)?;
        let pk_value = literal_value(&predicate.value)?;

        let mut payload = Record::new();
        for (column, literal) in &stmt.assignments {
            payload.insert(column.clone(), literal_value(literal)?);
        }

        let connector = ctx.registry.require(ctx.backend)?;
        log::debug!(
            "update: {} on {} where {} = {} ({} fields)",
            stmt.table,
            ctx.backend,
            pk_field,
            pk_value,
            payload.len()
        );
        let updated_count = connector
            .update(&stmt.table, pk_field, &pk_value, payload)
            .await?;
        Ok(QueryOutput::Updated {
            updated_count,
            backend: ctx.backend,
        })
    }
}
