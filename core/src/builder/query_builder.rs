use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::fragment::{Fragment, Segment};
use crate::dialect::Flavor;
use crate::error::{QueryError, Result};
use crate::utils::validate_direction;
use crate::value::BindValue;

/// 语句类型，在创建构建器时确定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "SELECT",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SELECT" => Ok(Operation::Select),
            "INSERT" => Ok(Operation::Insert),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            _ => Err(QueryError::UnsupportedOperation(s.to_string())),
        }
    }
}

/// 构建器处于打开状态时累积的语句内容
#[derive(Debug, Clone, Default)]
pub(crate) struct Statement {
    pub(crate) table: String,
    pub(crate) columns: Vec<String>,
    pub(crate) distinct: bool,
    pub(crate) joins: Vec<String>,
    pub(crate) conditions: Vec<Fragment>,
    pub(crate) group_by: Vec<String>,
    pub(crate) having: Vec<Fragment>,
    pub(crate) order_by: Option<String>,
    pub(crate) limit: i64,
    pub(crate) offset: i64,
    pub(crate) args: Vec<BindValue>,
    pub(crate) data: IndexMap<String, BindValue>,
    pub(crate) returning: Option<String>,
}

impl Statement {
    fn next_index(&self) -> usize {
        self.args.len() + 1
    }

    /// 校验 `?` 模板，并在当前参数之后为其编号
    fn predicate(&self, method: &'static str, template: &str, args: &[BindValue]) -> Result<Fragment> {
        if template.is_empty() {
            return Err(QueryError::EmptyCondition);
        }
        let fragment = Fragment::parse(template, self.next_index());
        let markers = fragment.param_count();
        if markers != args.len() {
            warn!(
                method,
                template,
                markers,
                args = args.len(),
                "placeholder count does not match argument count"
            );
        }
        Ok(fragment)
    }
}

#[derive(Debug, Clone)]
enum State {
    Open(Statement),
    Failed(QueryError),
}

/// 链式 SQL 语句构建器
///
/// 构建器只有两种状态：打开或失败。任何调用产生的第一个错误会被保留，
/// 之后的所有调用都不再生效，[`QueryBuilder::build`] 返回该错误。
///
/// # 示例
///
/// ```
/// use polysql::{binds, select, Dialect};
///
/// let (sql, args) = select(Dialect::Postgres, "users")
///     .and_where("age > ?", binds![18])
///     .or_where("vip = ?", binds![true])
///     .build()
///     .unwrap();
/// assert_eq!(sql, "SELECT * FROM users WHERE (age > $1 OR vip = $2)");
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    operation: Operation,
    flavor: Flavor,
    state: State,
}

impl QueryBuilder {
    /// 创建指定操作类型的构建器
    ///
    /// # 参数
    ///
    /// * `operation` - 语句类型
    /// * `flavor` - 目标方言（可直接传入 [`Dialect`](crate::Dialect)）
    /// * `table` - 表名，可带别名，如 `"users u"`
    ///
    /// # 返回值
    ///
    /// 表名为空时返回处于失败状态（`EmptyIdentifier`）的构建器；
    /// SELECT 的列默认为 `*`。
    pub fn new(operation: Operation, flavor: impl Into<Flavor>, table: &str) -> Self {
        let flavor = flavor.into();
        let mut builder = Self {
            operation,
            flavor,
            state: State::Open(Statement::default()),
        };
        match Self::open(operation, flavor, table) {
            Ok(statement) => builder.state = State::Open(statement),
            Err(err) => builder.fail("new", err),
        }
        builder
    }

    fn open(operation: Operation, flavor: Flavor, table: &str) -> Result<Statement> {
        if table.is_empty() {
            return Err(QueryError::EmptyIdentifier);
        }
        let table = flavor.escape(table)?;
        let columns = match operation {
            Operation::Select => vec!["*".to_string()],
            _ => Vec::new(),
        };
        Ok(Statement {
            table,
            columns,
            ..Default::default()
        })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// 已捕获的错误
    pub fn error(&self) -> Option<&QueryError> {
        match &self.state {
            State::Open(_) => None,
            State::Failed(err) => Some(err),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed(_))
    }

    fn fail(&mut self, method: &'static str, err: QueryError) {
        debug!(method, operation = %self.operation, error = %err, "statement builder failed");
        self.state = State::Failed(err);
    }

    fn apply<F>(mut self, method: &'static str, f: F) -> Self
    where
        F: FnOnce(&mut Statement, Flavor, Operation) -> Result<()>,
    {
        let (flavor, operation) = (self.flavor, self.operation);
        if let State::Open(statement) = &mut self.state {
            if let Err(err) = f(statement, flavor, operation) {
                self.fail(method, err);
            }
        }
        self
    }

    // ========== 列 ==========

    /// 追加查询列，默认的 `*` 会保留
    pub fn select<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply("select", |stmt, flavor, op| {
            expect_operation("select", op, Operation::Select)?;
            let escaped = escape_all(flavor, columns)?;
            stmt.columns.extend(escaped);
            Ok(())
        })
    }

    /// 替换查询列；空列表保留当前列
    pub(crate) fn replace_columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply("select", |stmt, flavor, op| {
            expect_operation("select", op, Operation::Select)?;
            let escaped = escape_all(flavor, columns)?;
            if !escaped.is_empty() {
                stmt.columns = escaped;
            }
            Ok(())
        })
    }

    pub(crate) fn count_column(self, column: &str) -> Self {
        self.apply("count", |stmt, flavor, _| {
            let column = if column.is_empty() { "*" } else { column };
            stmt.columns = vec![format!("COUNT({})", flavor.escape(column)?)];
            Ok(())
        })
    }

    /// 追加聚合列 `FUNCTION(column)`
    pub fn aggregate(self, function: &str, column: &str) -> Self {
        self.apply("aggregate", |stmt, flavor, op| {
            expect_operation("aggregate", op, Operation::Select)?;
            if function.is_empty() {
                return Err(QueryError::EmptyIdentifier);
            }
            let column = flavor.escape(column)?;
            stmt.columns.push(format!("{}({})", function, column));
            Ok(())
        })
    }

    pub fn distinct(self) -> Self {
        self.apply("distinct", |stmt, _, op| {
            expect_operation("distinct", op, Operation::Select)?;
            stmt.distinct = true;
            Ok(())
        })
    }

    // ========== JOIN ==========

    /// `LEFT JOIN table ON predicate`，`on` 原样写入（仅 SELECT）
    pub fn left_join(self, table: &str, on: &str) -> Self {
        self.join("LEFT", table, on)
    }

    pub fn inner_join(self, table: &str, on: &str) -> Self {
        self.join("INNER", table, on)
    }

    pub fn right_join(self, table: &str, on: &str) -> Self {
        self.join("RIGHT", table, on)
    }

    fn join(self, kind: &'static str, table: &str, on: &str) -> Self {
        self.apply("join", |stmt, flavor, op| {
            expect_operation("join", op, Operation::Select)?;
            let table = flavor.escape(table)?;
            stmt.joins.push(format!("{} JOIN {} ON {}", kind, table, on));
            Ok(())
        })
    }

    // ========== WHERE ==========

    /// 添加 AND 条件
    ///
    /// # 参数
    ///
    /// * `condition` - 条件模板，`?` 为占位符，与方言无关
    /// * `args` - 按顺序绑定到每个 `?` 的值
    ///
    /// 模板为空时返回 `EmptyCondition`；占位符数量与参数数量不一致时只记录警告。
    pub fn and_where<I, V>(self, condition: &str, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BindValue>,
    {
        let args: Vec<BindValue> = args.into_iter().map(Into::into).collect();
        self.apply("and_where", |stmt, _, _| {
            let fragment = stmt.predicate("and_where", condition, &args)?;
            stmt.conditions.push(fragment);
            stmt.args.extend(args);
            Ok(())
        })
    }

    /// 与上一个条件组合为 `(previous OR new)`；没有上一个条件时等同于
    /// [`and_where`](Self::and_where)
    pub fn or_where<I, V>(self, condition: &str, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BindValue>,
    {
        let args: Vec<BindValue> = args.into_iter().map(Into::into).collect();
        self.apply("or_where", |stmt, _, _| {
            let fragment = stmt.predicate("or_where", condition, &args)?;
            let combined = match stmt.conditions.pop() {
                Some(previous) => previous.or(fragment),
                None => fragment,
            };
            stmt.conditions.push(combined);
            stmt.args.extend(args);
            Ok(())
        })
    }

    /// 仅当 `value` 不是 NULL 也不是空字符串时添加条件
    pub fn and_where_if_not_empty(self, condition: &str, value: impl Into<BindValue>) -> Self {
        let value = value.into();
        if value.is_empty() {
            trace!(condition, "skipping condition for empty value");
            return self;
        }
        self.and_where(condition, [value])
    }

    /// IN 查询：`column IN (p1, p2, ...)`
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BindValue>,
    {
        let values: Vec<BindValue> = values.into_iter().map(Into::into).collect();
        self.apply("where_in", |stmt, flavor, _| {
            let column = flavor.escape(column)?;
            if values.is_empty() {
                warn!(column = %column, "IN list is empty");
            }
            let mut fragment = Fragment::sql(format!("{} IN (", column));
            for (i, param) in Fragment::allocate(stmt.next_index(), values.len())
                .into_iter()
                .enumerate()
            {
                if i > 0 {
                    fragment.push_sql(", ");
                }
                fragment.push(param);
            }
            fragment.push_sql(")");
            stmt.conditions.push(fragment);
            stmt.args.extend(values);
            Ok(())
        })
    }

    /// BETWEEN 范围查询：`column BETWEEN p1 AND p2`
    pub fn where_between(
        self,
        column: &str,
        start: impl Into<BindValue>,
        end: impl Into<BindValue>,
    ) -> Self {
        let (start, end) = (start.into(), end.into());
        self.apply("where_between", |stmt, flavor, _| {
            let column = flavor.escape(column)?;
            let [low, high]: [Segment; 2] = Fragment::allocate(stmt.next_index(), 2)
                .try_into()
                .map_err(|_| QueryError::InternalPlaceholderError("BETWEEN"))?;
            let mut fragment = Fragment::sql(format!("{} BETWEEN ", column));
            fragment.push(low);
            fragment.push_sql(" AND ");
            fragment.push(high);
            stmt.conditions.push(fragment);
            stmt.args.push(start);
            stmt.args.push(end);
            Ok(())
        })
    }

    // ========== GROUP BY / HAVING ==========

    /// 添加 GROUP BY 字段（可多次调用，仅 SELECT）
    pub fn group_by<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply("group_by", |stmt, flavor, op| {
            expect_operation("group_by", op, Operation::Select)?;
            let escaped = escape_all(flavor, columns)?;
            stmt.group_by.extend(escaped);
            Ok(())
        })
    }

    /// HAVING 条件，模板规则同 [`and_where`](Self::and_where)（仅 SELECT）
    pub fn having<I, V>(self, condition: &str, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BindValue>,
    {
        let args: Vec<BindValue> = args.into_iter().map(Into::into).collect();
        self.apply("having", |stmt, _, op| {
            expect_operation("having", op, Operation::Select)?;
            let fragment = stmt.predicate("having", condition, &args)?;
            stmt.having.push(fragment);
            stmt.args.extend(args);
            Ok(())
        })
    }

    // ========== ORDER BY / 分页 ==========

    /// 设置排序（仅 SELECT，后一次调用覆盖前一次）
    ///
    /// # 参数
    ///
    /// * `column` - 排序列
    /// * `direction` - `"ASC"` 或 `"DESC"`，其它值按 `ASC` 处理
    /// * `allowed` - 允许排序的列；给定且不包含 `column` 时改为按 `id` 排序
    pub fn order_by(self, column: &str, direction: &str, allowed: Option<&[&str]>) -> Self {
        self.apply("order_by", |stmt, flavor, op| {
            expect_operation("order_by", op, Operation::Select)?;
            let column = match allowed {
                Some(allowed) if !allowed.contains(&column) => {
                    debug!(column, "order column not allowed, falling back to id");
                    "id"
                }
                _ => column,
            };
            let column = flavor.escape(column)?;
            stmt.order_by = Some(format!("{} {}", column, validate_direction(direction)));
            Ok(())
        })
    }

    /// 设置 LIMIT（仅 SELECT），非正数时不输出
    pub fn limit(self, limit: i64) -> Self {
        self.apply("limit", |stmt, _, op| {
            expect_operation("limit", op, Operation::Select)?;
            stmt.limit = limit;
            Ok(())
        })
    }

    /// 设置 OFFSET（仅 SELECT），非正数时不输出
    pub fn offset(self, offset: i64) -> Self {
        self.apply("offset", |stmt, _, op| {
            expect_operation("offset", op, Operation::Select)?;
            stmt.offset = offset;
            Ok(())
        })
    }

    // ========== INSERT / UPDATE ==========

    /// INSERT 的列值，按迭代顺序输出
    pub fn values<I, K, V>(self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<BindValue>,
    {
        self.data("values", Operation::Insert, data)
    }

    /// UPDATE 的赋值列，按迭代顺序输出
    pub fn set<I, K, V>(self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<BindValue>,
    {
        self.data("set", Operation::Update, data)
    }

    fn data<I, K, V>(self, method: &'static str, expected: Operation, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<BindValue>,
    {
        self.apply(method, |stmt, flavor, op| {
            expect_operation(method, op, expected)?;
            let mut columns = IndexMap::new();
            for (column, value) in data {
                columns.insert(flavor.escape(column.as_ref())?, value.into());
            }
            if columns.is_empty() {
                return Err(QueryError::NoDataProvided(expected));
            }
            stmt.data = columns;
            Ok(())
        })
    }

    /// `RETURNING` 子句（仅 INSERT），只在 PostgreSQL 下输出
    pub fn returning(self, clause: &str) -> Self {
        self.apply("returning", |stmt, _, op| {
            expect_operation("returning", op, Operation::Insert)?;
            stmt.returning = Some(clause.to_string());
            Ok(())
        })
    }

    // ========== 子查询 ==========

    /// 构建子查询，返回 `(inner sql) AS alias` 供之后的模板使用
    ///
    /// 子查询的参数原样追加到当前参数之后，占位符不重新编号。
    /// PostgreSQL 下应在添加任何外层参数之前拼接子查询。
    ///
    /// # 返回值
    ///
    /// 当前构建器已失败或 `inner` 构建失败时返回空字符串，
    /// 后者会让当前构建器接管 `inner` 的错误。
    pub fn subquery(&mut self, inner: &QueryBuilder, alias: &str) -> String {
        if self.is_failed() {
            return String::new();
        }
        match inner.build() {
            Ok((sql, args)) => {
                if let State::Open(stmt) = &mut self.state {
                    stmt.args.extend(args);
                }
                format!("({}) AS {}", sql, alias)
            }
            Err(err) => {
                self.fail("subquery", err);
                String::new()
            }
        }
    }

    // ========== 构建 ==========

    /// 生成 SQL 与按占位符顺序排列的参数
    ///
    /// # 返回值
    ///
    /// * `Ok((sql, args))` - 构建成功
    /// * `Err(e)` - 构建过程中捕获的第一个错误
    pub fn build(&self) -> Result<(String, Vec<BindValue>)> {
        let stmt = match &self.state {
            State::Open(stmt) => stmt,
            State::Failed(err) => return Err(err.clone()),
        };
        let dialect = self.flavor.dialect;
        let (sql, args) = match self.operation {
            Operation::Select => stmt.render_select(dialect),
            Operation::Insert => stmt.render_insert(dialect)?,
            Operation::Update => stmt.render_update(dialect)?,
            Operation::Delete => stmt.render_delete(dialect),
        };
        trace!(%dialect, sql = %sql, args = args.len(), "statement built");
        Ok((sql, args))
    }
}

fn expect_operation(method: &'static str, actual: Operation, expected: Operation) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(QueryError::WrongOperation { method, expected })
    }
}

fn escape_all<I, S>(flavor: Flavor, names: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| flavor.escape(name.as_ref()))
        .collect()
}
