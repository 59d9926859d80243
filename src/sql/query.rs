//! Query builder - describe a SELECT with a fluent API.
//!
//! A [`Query`] is a list of sources plus clause expressions. Source 0 is the
//! FROM table and source `i + 1` is the table of join `i`; expressions refer
//! to sources by that position only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::alias::AliasBindings;
use super::error::CompileResult;
use super::expr::{Expr, Scope};
use super::schema::{EntityDescriptor, ModelDescriptor};
use super::token::{Token, TokenStream};
use crate::compile::Compiler;

// =============================================================================
// Sources
// =============================================================================

/// A table participating in a statement.
#[derive(Debug, Clone)]
pub struct Source {
    pub table: String,
    pub entity: Arc<dyn EntityDescriptor>,
}

impl Source {
    /// Source reading the entity's own table.
    pub fn new(entity: Arc<dyn EntityDescriptor>) -> Self {
        Self {
            table: entity.source().to_string(),
            entity,
        }
    }

    /// Source reading `table` with the entity's fields.
    pub fn with_table(table: impl Into<String>, entity: Arc<dyn EntityDescriptor>) -> Self {
        Self {
            table: table.into(),
            entity,
        }
    }

    /// Source whose table comes from a model lookup.
    pub fn for_model(model: &dyn ModelDescriptor, entity: Arc<dyn EntityDescriptor>) -> Self {
        Self::with_table(model.source_table(), entity)
    }

    fn to_tokens(&self, alias: &str) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(self.table.clone()))
            .space()
            .push(Token::As)
            .space()
            .push(Token::Ident(alias.to_string()));
        ts
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Type of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    fn to_tokens(self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            JoinKind::Inner => ts.push(Token::Inner),
            JoinKind::Left => ts.push(Token::Left).space().push(Token::Outer),
            JoinKind::Right => ts.push(Token::Right).space().push(Token::Outer),
            JoinKind::Full => ts.push(Token::Full).space().push(Token::Outer),
        };
        ts
    }
}

/// A JOIN clause. The joined table is the query source after the previous
/// join's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub on: Expr,
}

// =============================================================================
// Order By
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// ORDER BY term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByExpr {
    pub expr: Expr,
    #[serde(default)]
    pub dir: SortDir,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Desc,
        }
    }
}

impl From<Expr> for OrderByExpr {
    fn from(expr: Expr) -> Self {
        OrderByExpr::asc(expr)
    }
}

// =============================================================================
// Distinct / Lock
// =============================================================================

/// DISTINCT mode of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distinct {
    /// `SELECT DISTINCT`
    Rows,
    /// `SELECT DISTINCT ON (...)`; an empty list means plain DISTINCT.
    On(Vec<Expr>),
}

/// Row lock requested by the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lock {
    /// `FOR UPDATE`
    ForUpdate,
    /// Lock clause written verbatim, e.g. `FOR SHARE NOWAIT`.
    ///
    /// Never build this from user input; it is not escaped.
    Clause(String),
}

// =============================================================================
// Query
// =============================================================================

/// A SELECT query.
#[derive(Debug, Clone, Default)]
#[must_use = "builders have no effect until used"]
pub struct Query {
    pub sources: Vec<Source>,
    /// Projection. Empty selects every field of source 0.
    pub select: Vec<Expr>,
    pub distinct: Option<Distinct>,
    pub joins: Vec<Join>,
    pub wheres: Vec<Expr>,
    pub group_bys: Vec<Expr>,
    pub havings: Vec<Expr>,
    pub order_bys: Vec<OrderByExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub lock: Option<Lock>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the FROM source (source 0).
    pub fn from(mut self, source: Source) -> Self {
        if self.sources.is_empty() {
            self.sources.push(source);
        } else {
            self.sources[0] = source;
        }
        self
    }

    /// Set the projection.
    pub fn select(mut self, exprs: Vec<Expr>) -> Self {
        self.select = exprs;
        self
    }

    /// Use `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.distinct = Some(Distinct::Rows);
        self
    }

    /// Use `SELECT DISTINCT ON (...)`.
    pub fn distinct_on(mut self, exprs: Vec<Expr>) -> Self {
        self.distinct = Some(Distinct::On(exprs));
        self
    }

    /// Add a join. Call [`Query::from`] first: the joined source takes the
    /// next position.
    pub fn join(mut self, kind: JoinKind, source: Source, on: Expr) -> Self {
        self.sources.push(source);
        self.joins.push(Join { kind, on });
        self
    }

    /// Add an INNER JOIN.
    pub fn inner_join(self, source: Source, on: Expr) -> Self {
        self.join(JoinKind::Inner, source, on)
    }

    /// Add a LEFT OUTER JOIN.
    pub fn left_join(self, source: Source, on: Expr) -> Self {
        self.join(JoinKind::Left, source, on)
    }

    /// Add a WHERE condition (ANDed with existing conditions).
    pub fn filter(mut self, condition: Expr) -> Self {
        self.wheres.push(condition);
        self
    }

    /// Set the GROUP BY clause.
    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_bys = exprs;
        self
    }

    /// Add a HAVING condition (ANDed with existing conditions).
    pub fn having(mut self, condition: Expr) -> Self {
        self.havings.push(condition);
        self
    }

    /// Set the ORDER BY clause.
    pub fn order_by(mut self, exprs: Vec<OrderByExpr>) -> Self {
        self.order_bys = exprs;
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the lock clause.
    pub fn lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Fresh alias bindings for this query's sources.
    pub fn bind_aliases(&self) -> AliasBindings {
        AliasBindings::allocate(self.sources.iter().map(|s| s.table.as_str()))
    }

    /// Convert to token stream, one clause per line.
    pub fn to_tokens(&self, max_depth: usize) -> CompileResult<TokenStream> {
        let aliases = self.bind_aliases();
        let scope = Scope::new(&self.sources, &aliases, max_depth);

        let clauses = [
            Some(self.select_clause(&scope)?),
            self.from_clause(&scope)?,
            self.join_clauses(&scope)?,
            where_clause(&self.wheres, &scope)?,
            self.group_by_clause(&scope)?,
            conjunction(Token::Having, &self.havings, &scope)?,
            self.order_by_clause(&scope)?,
            self.limit.map(|n| keyword_value(Token::Limit, n)),
            self.offset.map(|n| keyword_value(Token::Offset, n)),
            self.lock_clause(),
        ];

        let mut ts = TokenStream::new();
        for (i, clause) in clauses.iter().flatten().enumerate() {
            if i > 0 {
                ts.newline();
            }
            ts.append(clause);
        }
        Ok(ts)
    }

    /// Generate SQL with the default compiler.
    pub fn to_sql(&self) -> CompileResult<String> {
        Compiler::default().select(self)
    }

    // =========================================================================
    // Clause renderers
    // =========================================================================

    fn select_clause(&self, scope: &Scope<'_>) -> CompileResult<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Select).space();

        match &self.distinct {
            None => {}
            Some(Distinct::On(exprs)) if !exprs.is_empty() => {
                ts.push(Token::Distinct)
                    .space()
                    .push(Token::On)
                    .space()
                    .lparen();
                ts.comma_separated(&render_all(exprs, scope)?);
                ts.rparen().space();
            }
            Some(_) => {
                ts.push(Token::Distinct).space();
            }
        }

        if self.select.is_empty() {
            ts.append(&Expr::Source(0).to_tokens(scope)?);
        } else {
            ts.comma_separated(&render_all(&self.select, scope)?);
        }
        Ok(ts)
    }

    fn from_clause(&self, scope: &Scope<'_>) -> CompileResult<Option<TokenStream>> {
        if self.sources.is_empty() {
            return Ok(None);
        }
        let (alias, source) = scope.source(0)?;
        let mut ts = TokenStream::new();
        ts.push(Token::From).space().append(&source.to_tokens(alias));
        Ok(Some(ts))
    }

    fn join_clauses(&self, scope: &Scope<'_>) -> CompileResult<Option<TokenStream>> {
        if self.joins.is_empty() {
            return Ok(None);
        }
        let mut ts = TokenStream::new();
        for (i, join) in self.joins.iter().enumerate() {
            let (alias, source) = scope.source(i + 1)?;
            if i > 0 {
                ts.newline();
            }
            ts.append(&join.kind.to_tokens())
                .space()
                .push(Token::Join)
                .space()
                .append(&source.to_tokens(alias))
                .space()
                .push(Token::On)
                .space()
                .append(&join.on.to_tokens(scope)?);
        }
        Ok(Some(ts))
    }

    fn group_by_clause(&self, scope: &Scope<'_>) -> CompileResult<Option<TokenStream>> {
        if self.group_bys.is_empty() {
            return Ok(None);
        }
        let mut ts = TokenStream::new();
        ts.push(Token::GroupBy).space();
        ts.comma_separated(&render_all(&self.group_bys, scope)?);
        Ok(Some(ts))
    }

    fn order_by_clause(&self, scope: &Scope<'_>) -> CompileResult<Option<TokenStream>> {
        if self.order_bys.is_empty() {
            return Ok(None);
        }
        let terms = self
            .order_bys
            .iter()
            .map(|order| {
                let mut term = order.expr.to_tokens(scope)?;
                if order.dir == SortDir::Desc {
                    term.space().push(Token::Desc);
                }
                Ok(term)
            })
            .collect::<CompileResult<Vec<_>>>()?;

        let mut ts = TokenStream::new();
        ts.push(Token::OrderBy).space();
        ts.comma_separated(&terms);
        Ok(Some(ts))
    }

    fn lock_clause(&self) -> Option<TokenStream> {
        let token = match self.lock.as_ref()? {
            Lock::ForUpdate => Token::ForUpdate,
            Lock::Clause(clause) => Token::Raw(clause.clone()),
        };
        let mut ts = TokenStream::new();
        ts.push(token);
        Some(ts)
    }
}

fn render_all(exprs: &[Expr], scope: &Scope<'_>) -> CompileResult<Vec<TokenStream>> {
    exprs.iter().map(|e| e.to_tokens(scope)).collect()
}

fn keyword_value(keyword: Token, n: u64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(keyword).space().push(Token::LitUnsigned(n));
    ts
}

/// `<keyword> (e1) AND (e2) ...`, or nothing when `exprs` is empty.
fn conjunction(
    keyword: Token,
    exprs: &[Expr],
    scope: &Scope<'_>,
) -> CompileResult<Option<TokenStream>> {
    if exprs.is_empty() {
        return Ok(None);
    }
    let mut ts = TokenStream::new();
    ts.push(keyword).space();
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            ts.space().push(Token::And).space();
        }
        ts.lparen().append(&expr.to_tokens(scope)?).rparen();
    }
    Ok(Some(ts))
}

/// WHERE clause shared by SELECT and the bulk statements.
pub(crate) fn where_clause(
    exprs: &[Expr],
    scope: &Scope<'_>,
) -> CompileResult<Option<TokenStream>> {
    conjunction(Token::Where, exprs, scope)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::Postgres;
    use crate::sql::error::CompileError;
    use crate::sql::expr::{call, field, lit, ExprExt};
    use crate::sql::schema::Schema;
    use crate::sql::test_utils::validate_sql;

    fn users() -> Source {
        Source::new(Arc::new(
            Schema::new("users").with_fields(["id", "name", "age"]),
        ))
    }

    fn posts() -> Source {
        Source::new(Arc::new(
            Schema::new("posts").with_fields(["id", "user_id", "title"]),
        ))
    }

    fn sql(query: &Query) -> String {
        query.to_tokens(512).unwrap().serialize(&Postgres)
    }

    #[test]
    fn test_default_projection_expands_source() {
        let query = Query::new().from(users());
        let sql = sql(&query);
        assert_eq!(
            sql,
            "SELECT \"u0\".\"id\", \"u0\".\"name\", \"u0\".\"age\"\nFROM \"users\" AS \"u0\""
        );
        validate_sql(&sql).unwrap();
    }

    #[test]
    fn test_fieldless_entity_selects_star() {
        let query = Query::new().from(Source::new(Arc::new(Schema::new("users"))));
        assert_eq!(sql(&query), "SELECT \"u0\".*\nFROM \"users\" AS \"u0\"");
    }

    struct Archive;

    impl ModelDescriptor for Archive {
        fn source_table(&self) -> &str {
            "archived_users"
        }
    }

    #[test]
    fn test_model_table_overrides_entity_source() {
        let entity = Arc::new(Schema::new("users").with_fields(["id", "name"]));
        let source = Source::for_model(&Archive, entity);
        assert_eq!(source.table, "archived_users");
        assert_eq!(source.entity.source(), "users");

        let query = Query::new()
            .from(source)
            .filter(field(0, "name").eq("ann"));
        let sql = sql(&query);
        assert_eq!(
            sql,
            "SELECT \"a0\".\"id\", \"a0\".\"name\"\nFROM \"archived_users\" AS \"a0\"\nWHERE (\"a0\".\"name\" = 'ann')"
        );
        validate_sql(&sql).unwrap();
    }

    #[test]
    fn test_clause_order() {
        let query = Query::new()
            .from(users())
            .select(vec![field(0, "name")])
            .filter(field(0, "age").gte(18))
            .filter(field(0, "name").is_not_null())
            .order_by(vec![OrderByExpr::desc(field(0, "age"))])
            .limit(10)
            .offset(20);

        let sql = sql(&query);
        assert_eq!(
            sql,
            "SELECT \"u0\".\"name\"\n\
             FROM \"users\" AS \"u0\"\n\
             WHERE (\"u0\".\"age\" >= 18) AND (\"u0\".\"name\" IS NOT NULL)\n\
             ORDER BY \"u0\".\"age\" DESC\n\
             LIMIT 10\n\
             OFFSET 20"
        );
        assert!(!sql.contains("GROUP BY"));
        validate_sql(&sql).unwrap();
    }

    #[test]
    fn test_joins() {
        let query = Query::new()
            .from(users())
            .select(vec![field(0, "name"), field(1, "title")])
            .left_join(posts(), field(1, "user_id").eq(field(0, "id")))
            .join(
                JoinKind::Full,
                Source::with_table("users", Arc::new(Schema::new("users"))),
                field(2, "id").eq(field(1, "user_id")),
            );

        let sql = sql(&query);
        assert_eq!(
            sql,
            "SELECT \"u0\".\"name\", \"p0\".\"title\"\n\
             FROM \"users\" AS \"u0\"\n\
             LEFT OUTER JOIN \"posts\" AS \"p0\" ON \"p0\".\"user_id\" = \"u0\".\"id\"\n\
             FULL OUTER JOIN \"users\" AS \"u1\" ON \"u1\".\"id\" = \"p0\".\"user_id\""
        );
        validate_sql(&sql).unwrap();
    }

    #[test]
    fn test_join_kinds() {
        let render = |kind: JoinKind| kind.to_tokens().serialize(&Postgres);
        assert_eq!(render(JoinKind::Inner), "INNER");
        assert_eq!(render(JoinKind::Left), "LEFT OUTER");
        assert_eq!(render(JoinKind::Right), "RIGHT OUTER");
        assert_eq!(render(JoinKind::Full), "FULL OUTER");
    }

    #[test]
    fn test_join_without_source_fails() {
        let mut query = Query::new().from(users());
        query.joins.push(Join {
            kind: JoinKind::Inner,
            on: lit(true),
        });
        assert_eq!(
            query.to_tokens(512).unwrap_err(),
            CompileError::OutOfRangeSourceReference { index: 1, len: 1 }
        );
    }

    #[test]
    fn test_group_by_having() {
        let query = Query::new()
            .from(users())
            .select(vec![field(0, "age"), call("count", vec![field(0, "id")])])
            .group_by(vec![field(0, "age")])
            .having(call("count", vec![field(0, "id")]).gt(1))
            .having(field(0, "age").lt(90));

        let sql = sql(&query);
        assert_eq!(
            sql,
            "SELECT \"u0\".\"age\", count(\"u0\".\"id\")\n\
             FROM \"users\" AS \"u0\"\n\
             GROUP BY \"u0\".\"age\"\n\
             HAVING (count(\"u0\".\"id\") > 1) AND (\"u0\".\"age\" < 90)"
        );
        validate_sql(&sql).unwrap();
    }

    #[test]
    fn test_distinct_variants() {
        let base = Query::new().from(users()).select(vec![field(0, "name")]);

        assert!(sql(&base.clone().distinct()).starts_with("SELECT DISTINCT \"u0\".\"name\""));
        assert!(
            sql(&base.clone().distinct_on(vec![field(0, "age"), field(0, "id")]))
                .starts_with("SELECT DISTINCT ON (\"u0\".\"age\", \"u0\".\"id\") \"u0\".\"name\"")
        );
        assert!(sql(&base.distinct_on(vec![])).starts_with("SELECT DISTINCT \"u0\".\"name\""));
    }

    #[test]
    fn test_lock_clauses() {
        let base = Query::new().from(users()).select(vec![field(0, "id")]);
        assert!(sql(&base.clone().lock(Lock::ForUpdate)).ends_with("\nFOR UPDATE"));
        assert!(sql(&base.clone().lock(Lock::Clause("FOR SHARE NOWAIT".into())))
            .ends_with("\nFOR SHARE NOWAIT"));
        assert!(!sql(&base).contains("FOR "));
    }

    #[test]
    fn test_no_sources_omits_from() {
        let query = Query::new().select(vec![call("now", vec![])]);
        assert_eq!(sql(&query), "SELECT localtimestamp");
    }

    #[test]
    fn test_empty_projection_without_source_fails() {
        let err = Query::new().to_tokens(512).unwrap_err();
        assert!(matches!(err, CompileError::OutOfRangeSourceReference { .. }));
    }
}
