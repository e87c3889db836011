//! DELETE 策略
//!
//! 谓词校验同 SELECT/UPDATE: 必须按声明主键寻址, 右侧必须是字面量
//! (解析层已保证谓词右侧只可能是字面量)。返回实际删除条数与落点后端,
//! 删除不存在的记录返回 0 而非报错。

use async_trait::async_trait;

use super::{
    literal_value, require_predicate, resolve_pk_column, ExecutionStrategy, QueryOutput,
    StrategyContext,
};
use crate::Result;

pub struct DeleteStrategy;

#[async_trait]
impl ExecutionStrategy for DeleteStrategy {
    async fn execute(&self, ctx: StrategyContext<'_>) -> Result<QueryOutput> {
        let stmt = ctx.statement;
        let predicate = require_predicate(stmt, "DELETE")?;
        let pk_field = resolve_pk_column(&stmt.table, predicate, ctx.pk_field)?;
        let pk_value = literal_value(&predicate.value)?;

        let connector = ctx.registry.require(ctx.backend)?;
        log::debug!(
            "delete: {} on {} where {} = {}",
            stmt.table,
            ctx.backend,
            pk_field,
            pk_value
        );
        let deleted_count = connector.delete(&stmt.table, pk_field, &pk_value).await?;
        Ok(QueryOutput::Deleted {
            deleted_count,
            backend: ctx.backend,
        })
    }
}
