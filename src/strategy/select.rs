//! SELECT 策略
//!
//! 只接受 `SELECT *` + 主键等值谓词的点查; 命中包装成单元素序列,
//! 未命中返回空序列。

use async_trait::async_trait;

use super::{
    literal_value, require_predicate, resolve_pk_column, ExecutionStrategy, QueryOutput,
    StrategyContext,
};
use crate::parser::Projection;
use crate::{PolyError, Result};

pub struct SelectStrategy;

#[async_trait]
impl ExecutionStrategy for SelectStrategy {
    async fn execute(&self, ctx: StrategyContext<'_>) -> Result<QueryOutput> {
        let stmt = ctx.statement;
        if !matches!(stmt.projection, Projection::Wildcard) {
            return Err(PolyError::UnsupportedQuery(
                "only 'SELECT *' projections are supported".to_string(),
            ));
        }
        let predicate = require_predicate(stmt, "SELECT")?;
        let pk_field = resolve_pk_column(&stmt.table, predicate, ctx.pk_field)?;
        let pk_value = literal_value(&predicate.value)?;

        let connector = ctx.registry.require(ctx.backend)?;
        log::debug!(
            "select: {} on {} where {} = {}",
            stmt.table,
            ctx.backend,
            pk_field,
            pk_value
        );
        let record = connector.get(&stmt.table, pk_field, &pk_value).await?;
        Ok(QueryOutput::Rows(record.into_iter().collect()))
    }
}
