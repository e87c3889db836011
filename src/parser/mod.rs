//! SQL 子集解析
//!
//! 对 `sqlparser` 的薄封装: 把四类语句 (SELECT/INSERT/UPDATE/DELETE)
//! 转换成本 crate 的 `ParsedStatement`, 子集之外的任何形状在触达连接器
//! 之前一律以 `UnsupportedQuery` 拒绝。上层只依赖 `ParsedStatement`,
//! 不感知具体语法库。
//!
//! 支持的子集:
//! - 单语句, 单表, 无 JOIN
//! - 谓词只允许 `列 = 字面量` 的单列等值形式
//! - INSERT 只允许显式列清单 + VALUES 字面量行

use sqlparser::ast as sql_ast;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;

use crate::{PolyError, Result};

// ═══════════════════════════════════════════════════════════════════════════
// 语句模型
// ═══════════════════════════════════════════════════════════════════════════

/// 语句类型 (闭合枚举, 策略分发按它静态查表)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// SELECT 投影形状
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `SELECT *`
    Wildcard,
    /// 显式列清单 (策略层拒绝, 仅为报错信息保留列名)
    Columns(Vec<String>),
}

/// 字面量
///
/// 数字保留原始文本, 类型化 (先 i64 后 f64) 推迟到策略层进行。
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(String),
    Bool(bool),
    Null,
}

/// 等值谓词: `column = literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub value: Literal,
}

/// 解析后的语句
///
/// 生命周期不超过单次执行, 任何组件都不保留它的引用。
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub kind: StatementKind,
    /// 目标表 / 实体名, 原样保留大小写
    pub table: String,
    /// SELECT 投影
    pub projection: Projection,
    /// INSERT 列清单
    pub columns: Vec<String>,
    /// INSERT 的 VALUES 行 (多行保留, 由策略层拒绝)
    pub rows: Vec<Vec<Literal>>,
    /// UPDATE 的 SET 赋值, 按书写顺序
    pub assignments: Vec<(String, Literal)>,
    /// WHERE 等值谓词
    pub predicate: Option<Predicate>,
}

impl ParsedStatement {
    fn new(kind: StatementKind, table: String) -> Self {
        Self {
            kind,
            table,
            projection: Projection::Wildcard,
            columns: Vec::new(),
            rows: Vec::new(),
            assignments: Vec::new(),
            predicate: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// 解析入口
// ═══════════════════════════════════════════════════════════════════════════

/// 解析一条 SQL, 子集之外的形状返回 `UnsupportedQuery`
pub fn parse(sql: &str) -> Result<ParsedStatement> {
    if sql.trim().is_empty() {
        return Err(PolyError::UnsupportedQuery("empty statement".to_string()));
    }
    let dialect = GenericDialect {};
    let mut statements = SqlParser::parse_sql(&dialect, sql)?;
    if statements.len() != 1 {
        return Err(PolyError::UnsupportedQuery(format!(
            "expected exactly one statement, got {}",
            statements.len()
        )));
    }
    convert(statements.remove(0))
}

fn convert(stmt: sql_ast::Statement) -> Result<ParsedStatement> {
    match stmt {
        sql_ast::Statement::Query(query) => convert_select(*query),
        sql_ast::Statement::Insert {
            table_name,
            columns,
            source,
            ..
        } => convert_insert(table_name, columns, source),
        sql_ast::Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => convert_update(table, assignments, selection),
        sql_ast::Statement::Delete {
            from, selection, ..
        } => convert_delete(from, selection),
        other => Err(PolyError::UnsupportedQuery(format!(
            "unsupported statement kind: {}",
            statement_label(&other)
        ))),
    }
}

fn convert_select(query: sql_ast::Query) -> Result<ParsedStatement> {
    let select = match *query.body {
        sql_ast::SetExpr::Select(select) => *select,
        _ => {
            return Err(PolyError::UnsupportedQuery(
                "only plain SELECT is supported".to_string(),
            ))
        }
    };

    let table = single_table(&select.from)?;
    let mut parsed = ParsedStatement::new(StatementKind::Select, table);

    parsed.projection = convert_projection(&select.projection)?;
    parsed.predicate = select.selection.map(extract_predicate).transpose()?;
    Ok(parsed)
}

fn convert_projection(items: &[sql_ast::SelectItem]) -> Result<Projection> {
    if items.len() == 1 {
        if let sql_ast::SelectItem::Wildcard(_) = items[0] {
            return Ok(Projection::Wildcard);
        }
    }
    let mut columns = Vec::with_capacity(items.len());
    for item in items {
        match item {
            sql_ast::SelectItem::UnnamedExpr(sql_ast::Expr::Identifier(ident)) => {
                columns.push(ident.value.clone());
            }
            _ => {
                return Err(PolyError::UnsupportedQuery(
                    "only '*' or plain column projections are supported".to_string(),
                ))
            }
        }
    }
    Ok(Projection::Columns(columns))
}

fn convert_insert(
    table_name: sql_ast::ObjectName,
    columns: Vec<sql_ast::Ident>,
    source: Option<Box<sql_ast::Query>>,
) -> Result<ParsedStatement> {
    let table = object_name(&table_name)?;
    let mut parsed = ParsedStatement::new(StatementKind::Insert, table);
    parsed.columns = columns.into_iter().map(|c| c.value).collect();

    let query = source.ok_or_else(|| {
        PolyError::UnsupportedQuery("INSERT requires a VALUES clause".to_string())
    })?;
    let values = match *query.body {
        sql_ast::SetExpr::Values(values) => values,
        _ => {
            return Err(PolyError::UnsupportedQuery(
                "INSERT source must be a VALUES clause".to_string(),
            ))
        }
    };
    for row in values.rows {
        let literals: Result<Vec<Literal>> = row.into_iter().map(literal_from_expr).collect();
        parsed.rows.push(literals?);
    }
    Ok(parsed)
}

fn convert_update(
    table: sql_ast::TableWithJoins,
    assignments: Vec<sql_ast::Assignment>,
    selection: Option<sql_ast::Expr>,
) -> Result<ParsedStatement> {
    if !table.joins.is_empty() {
        return Err(PolyError::UnsupportedQuery(
            "UPDATE with joins is not supported".to_string(),
        ));
    }
    let name = table_factor_name(&table.relation)?;
    let mut parsed = ParsedStatement::new(StatementKind::Update, name);

    for assign in assignments {
        if assign.id.len() != 1 {
            return Err(PolyError::UnsupportedQuery(
                "compound assignment targets are not supported".to_string(),
            ));
        }
        let column = assign.id[0].value.clone();
        parsed
            .assignments
            .push((column, literal_from_expr(assign.value)?));
    }
    parsed.predicate = selection.map(extract_predicate).transpose()?;
    Ok(parsed)
}

fn convert_delete(
    from: Vec<sql_ast::TableWithJoins>,
    selection: Option<sql_ast::Expr>,
) -> Result<ParsedStatement> {
    let table = single_table(&from)?;
    let mut parsed = ParsedStatement::new(StatementKind::Delete, table);
    parsed.predicate = selection.map(extract_predicate).transpose()?;
    Ok(parsed)
}

// ═══════════════════════════════════════════════════════════════════════════
// 辅助转换
// ═══════════════════════════════════════════════════════════════════════════

fn single_table(from: &[sql_ast::TableWithJoins]) -> Result<String> {
    if from.len() != 1 || !from[0].joins.is_empty() {
        return Err(PolyError::UnsupportedQuery(
            "exactly one table without joins is required".to_string(),
        ));
    }
    table_factor_name(&from[0].relation)
}

fn table_factor_name(factor: &sql_ast::TableFactor) -> Result<String> {
    match factor {
        sql_ast::TableFactor::Table { name, .. } => object_name(name),
        _ => Err(PolyError::UnsupportedQuery(
            "only plain table references are supported".to_string(),
        )),
    }
}

fn object_name(name: &sql_ast::ObjectName) -> Result<String> {
    match name.0.as_slice() {
        [ident] => Ok(ident.value.clone()),
        _ => Err(PolyError::UnsupportedQuery(
            "qualified table names are not supported".to_string(),
        )),
    }
}

/// WHERE 子句必须是 `列 = 字面量` 的单列等值比较
fn extract_predicate(expr: sql_ast::Expr) -> Result<Predicate> {
    match expr {
        sql_ast::Expr::Nested(inner) => extract_predicate(*inner),
        sql_ast::Expr::BinaryOp { left, op, right } => {
            if op != sql_ast::BinaryOperator::Eq {
                return Err(PolyError::UnsupportedQuery(
                    "only a single equality predicate is supported".to_string(),
                ));
            }
            let column = match *left {
                sql_ast::Expr::Identifier(ident) => ident.value,
                _ => {
                    return Err(PolyError::UnsupportedQuery(
                        "predicate must compare a single plain column".to_string(),
                    ))
                }
            };
            let value = literal_from_expr(*right)?;
            Ok(Predicate { column, value })
        }
        _ => Err(PolyError::UnsupportedQuery(
            "only a single equality predicate is supported".to_string(),
        )),
    }
}

fn literal_from_expr(expr: sql_ast::Expr) -> Result<Literal> {
    match expr {
        sql_ast::Expr::Value(value) => literal_from_value(value),
        // 负数被解析为 一元负号 + 数字
        sql_ast::Expr::UnaryOp {
            op: sql_ast::UnaryOperator::Minus,
            expr,
        } => match *expr {
            sql_ast::Expr::Value(sql_ast::Value::Number(n, _)) => {
                Ok(Literal::Number(format!("-{}", n)))
            }
            _ => Err(PolyError::UnsupportedQuery(
                "only literal values are supported".to_string(),
            )),
        },
        _ => Err(PolyError::UnsupportedQuery(
            "only literal values are supported".to_string(),
        )),
    }
}

fn literal_from_value(value: sql_ast::Value) -> Result<Literal> {
    match value {
        sql_ast::Value::SingleQuotedString(s) | sql_ast::Value::DoubleQuotedString(s) => {
            Ok(Literal::String(s))
        }
        sql_ast::Value::Number(n, _) => Ok(Literal::Number(n)),
        sql_ast::Value::Boolean(b) => Ok(Literal::Bool(b)),
        sql_ast::Value::Null => Ok(Literal::Null),
        other => Err(PolyError::UnsupportedQuery(format!(
            "unsupported literal: {}",
            other
        ))),
    }
}

fn statement_label(stmt: &sql_ast::Statement) -> &'static str {
    match stmt {
        sql_ast::Statement::CreateTable { .. } => "CREATE TABLE",
        sql_ast::Statement::Drop { .. } => "DROP",
        sql_ast::Statement::AlterTable { .. } => "ALTER TABLE",
        sql_ast::Statement::Truncate { .. } => "TRUNCATE",
        _ => "statement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select_wildcard_with_predicate() {
        let stmt = parse("SELECT * FROM customers WHERE customerId = 'ALFKI'").unwrap();
        assert_eq!(stmt.kind, StatementKind::Select);
        assert_eq!(stmt.table, "customers");
        assert_eq!(stmt.projection, Projection::Wildcard);
        let pred = stmt.predicate.unwrap();
        assert_eq!(pred.column, "customerId");
        assert_eq!(pred.value, Literal::String("ALFKI".to_string()));
    }

    #[test]
    fn test_parse_select_numeric_predicate() {
        let stmt = parse("SELECT * FROM products WHERE productId = 1").unwrap();
        let pred = stmt.predicate.unwrap();
        assert_eq!(pred.value, Literal::Number("1".to_string()));
    }

    #[test]
    fn test_parse_select_column_projection_recorded() {
        let stmt = parse("SELECT productName FROM products WHERE productId = 1").unwrap();
        assert_eq!(
            stmt.projection,
            Projection::Columns(vec!["productName".to_string()])
        );
    }

    #[test]
    fn test_parse_select_without_predicate() {
        let stmt = parse("SELECT * FROM products").unwrap();
        assert!(stmt.predicate.is_none());
    }

    #[test]
    fn test_parse_insert() {
        let stmt =
            parse("INSERT INTO products (productId, productName) VALUES (1, 'Chai')").unwrap();
        assert_eq!(stmt.kind, StatementKind::Insert);
        assert_eq!(stmt.table, "products");
        assert_eq!(stmt.columns, vec!["productId", "productName"]);
        assert_eq!(stmt.rows.len(), 1);
        assert_eq!(
            stmt.rows[0],
            vec![
                Literal::Number("1".to_string()),
                Literal::String("Chai".to_string())
            ]
        );
    }

    /// 多行 VALUES 原样保留, 拒绝动作在策略层
    #[test]
    fn test_parse_insert_multi_row_kept() {
        let stmt = parse("INSERT INTO t (id) VALUES (1), (2)").unwrap();
        assert_eq!(stmt.rows.len(), 2);
    }

    #[test]
    fn test_parse_update() {
        let stmt =
            parse("UPDATE customers SET companyName = 'Acme', city = 'Berlin' WHERE customerId = 'X1'")
                .unwrap();
        assert_eq!(stmt.kind, StatementKind::Update);
        assert_eq!(stmt.assignments.len(), 2);
        assert_eq!(stmt.assignments[0].0, "companyName");
        assert_eq!(
            stmt.assignments[1].1,
            Literal::String("Berlin".to_string())
        );
        assert_eq!(stmt.predicate.unwrap().column, "customerId");
    }

    #[test]
    fn test_parse_update_without_predicate() {
        let stmt = parse("UPDATE customers SET x = 1").unwrap();
        assert!(stmt.predicate.is_none());
    }

    #[test]
    fn test_parse_delete() {
        let stmt = parse("DELETE FROM Person WHERE id = 'DEL-1'").unwrap();
        assert_eq!(stmt.kind, StatementKind::Delete);
        assert_eq!(stmt.table, "Person");
        assert_eq!(stmt.predicate.unwrap().column, "id");
    }

    #[test]
    fn test_parse_negative_number() {
        let stmt = parse("UPDATE t SET delta = -5 WHERE id = 1").unwrap();
        assert_eq!(stmt.assignments[0].1, Literal::Number("-5".to_string()));
    }

    #[test]
    fn test_reject_join() {
        let err = parse("SELECT * FROM a JOIN b ON a.id = b.id WHERE id = 1").unwrap_err();
        assert!(matches!(err, PolyError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_reject_and_predicate() {
        let err = parse("SELECT * FROM t WHERE a = 1 AND b = 2").unwrap_err();
        assert!(matches!(err, PolyError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_reject_non_equality_predicate() {
        let err = parse("SELECT * FROM t WHERE id > 1").unwrap_err();
        assert!(matches!(err, PolyError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_reject_compound_predicate_column() {
        let err = parse("SELECT * FROM t WHERE t.id = 1").unwrap_err();
        assert!(matches!(err, PolyError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_reject_non_literal_predicate_value() {
        let err = parse("DELETE FROM t WHERE id = other_column").unwrap_err();
        assert!(matches!(err, PolyError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_reject_multiple_statements() {
        let err = parse("SELECT * FROM t; SELECT * FROM u").unwrap_err();
        assert!(matches!(err, PolyError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_reject_unsupported_kind() {
        let err = parse("DROP TABLE customers").unwrap_err();
        assert!(matches!(err, PolyError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_syntax_error_propagates() {
        let err = parse("SELEKT * FORM t").unwrap_err();
        assert!(matches!(err, PolyError::ParseError(_)));
    }
}
