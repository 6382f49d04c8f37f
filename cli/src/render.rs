use std::collections::VecDeque;

use anyhow::{bail, Context, Result};
use polysql::{count, select_columns, BindValue, Flavor, Operation, QueryBuilder};
use serde::Serialize;
use tracing::debug;

#[derive(clap::Args, Debug, Default)]
pub struct RenderArgs {
    /// Statement kind: select, insert, update or delete
    pub operation: String,

    #[arg(short, long)]
    pub table: String,

    /// Column to select (repeatable)
    #[arg(short = 'c', long = "column")]
    pub columns: Vec<String>,

    #[arg(long)]
    pub distinct: bool,

    /// Select COUNT(column); without a value counts `*`
    #[arg(long, num_args = 0..=1, default_missing_value = "*")]
    pub count: Option<String>,

    /// Join as KIND:TABLE:ON, where KIND is left, inner or right
    #[arg(long = "join", value_name = "KIND:TABLE:ON")]
    pub joins: Vec<String>,

    /// Condition joined with AND; `?` marks a value taken from --arg
    #[arg(short = 'w', long = "where", value_name = "TEMPLATE")]
    pub wheres: Vec<String>,

    /// Condition OR-ed with the previous one
    #[arg(long = "or-where", value_name = "TEMPLATE")]
    pub or_wheres: Vec<String>,

    /// Value for the next `?` in --where, --or-where, then --having
    #[arg(short = 'a', long = "arg", value_name = "VALUE", allow_hyphen_values = true)]
    pub args: Vec<String>,

    #[arg(long = "where-in", value_name = "COLUMN=V1,V2")]
    pub where_in: Vec<String>,

    #[arg(long, value_name = "COLUMN=LOW,HIGH")]
    pub between: Vec<String>,

    #[arg(long = "group-by")]
    pub group_by: Vec<String>,

    #[arg(long, value_name = "TEMPLATE")]
    pub having: Vec<String>,

    #[arg(long = "order-by")]
    pub order_by: Option<String>,

    #[arg(long)]
    pub desc: bool,

    #[arg(long)]
    pub limit: Option<i64>,

    #[arg(long)]
    pub offset: Option<i64>,

    /// Column value for insert or update (repeatable)
    #[arg(long = "value", value_name = "COLUMN=VALUE")]
    pub values: Vec<String>,

    #[arg(long)]
    pub returning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Rendered {
    pub sql: String,
    pub args: Vec<BindValue>,
}

/// Parses a command-line literal: `null`, `true`/`false`, integers and
/// floats are typed; single quotes force text; everything else is text.
pub fn parse_literal(raw: &str) -> BindValue {
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return BindValue::String(raw[1..raw.len() - 1].to_string());
    }
    if raw.eq_ignore_ascii_case("null") {
        return BindValue::Null;
    }
    if raw.eq_ignore_ascii_case("true") {
        return BindValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return BindValue::Bool(false);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return BindValue::Int64(i);
    }
    if raw.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = raw.parse::<f64>() {
            return BindValue::Float64(f);
        }
    }
    BindValue::String(raw.to_string())
}

fn split_pair<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    raw.split_once('=')
        .with_context(|| format!("{flag} expects COLUMN=VALUE, got '{raw}'"))
}

/// Hands out `--arg` values to templates in order.
struct ArgQueue(VecDeque<BindValue>);

impl ArgQueue {
    fn take_for(&mut self, template: &str) -> Result<Vec<BindValue>> {
        let needed = template.matches('?').count();
        if needed > self.0.len() {
            bail!(
                "Template '{}' needs {} argument(s), only {} left",
                template,
                needed,
                self.0.len()
            );
        }
        Ok(self.0.drain(..needed).collect())
    }
}

fn apply_join(builder: QueryBuilder, raw: &str) -> Result<QueryBuilder> {
    let mut parts = raw.splitn(3, ':');
    let (Some(kind), Some(table), Some(on)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("--join expects KIND:TABLE:ON, got '{raw}'");
    };
    Ok(match kind.to_ascii_lowercase().as_str() {
        "left" => builder.left_join(table, on),
        "inner" => builder.inner_join(table, on),
        "right" => builder.right_join(table, on),
        other => bail!("Unknown join kind '{other}', expected left, inner or right"),
    })
}

pub fn render(flavor: Flavor, args: &RenderArgs) -> Result<Rendered> {
    let operation: Operation = args
        .operation
        .parse()
        .context("Failed to parse operation")?;

    let mut builder = match (operation, &args.count) {
        (Operation::Select, Some(column)) => count(flavor, &args.table, column),
        (Operation::Select, None) => select_columns(flavor, &args.table, &args.columns),
        (_, Some(_)) => bail!("--count only applies to select"),
        (op, None) => {
            let builder = QueryBuilder::new(op, flavor, &args.table);
            if args.columns.is_empty() {
                builder
            } else {
                builder.select(&args.columns)
            }
        }
    };

    if args.distinct {
        builder = builder.distinct();
    }
    for join in &args.joins {
        builder = apply_join(builder, join)?;
    }

    let mut queue = ArgQueue(args.args.iter().map(|a| parse_literal(a)).collect());
    for template in &args.wheres {
        let values = queue.take_for(template)?;
        builder = builder.and_where(template, values);
    }
    for template in &args.or_wheres {
        let values = queue.take_for(template)?;
        builder = builder.or_where(template, values);
    }
    for raw in &args.where_in {
        let (column, list) = split_pair(raw, "--where-in")?;
        builder = builder.where_in(column, list.split(',').map(parse_literal));
    }
    for raw in &args.between {
        let (column, range) = split_pair(raw, "--between")?;
        let Some((low, high)) = range.split_once(',') else {
            bail!("--between expects COLUMN=LOW,HIGH, got '{raw}'");
        };
        builder = builder.where_between(column, parse_literal(low), parse_literal(high));
    }
    if !args.group_by.is_empty() {
        builder = builder.group_by(&args.group_by);
    }
    for template in &args.having {
        let values = queue.take_for(template)?;
        builder = builder.having(template, values);
    }
    if !queue.0.is_empty() {
        bail!("{} --arg value(s) were not consumed by any template", queue.0.len());
    }

    if let Some(column) = &args.order_by {
        let direction = if args.desc { "DESC" } else { "ASC" };
        builder = builder.order_by(column, direction, None);
    }
    if let Some(limit) = args.limit {
        builder = builder.limit(limit);
    }
    if let Some(offset) = args.offset {
        builder = builder.offset(offset);
    }

    if !args.values.is_empty() {
        let pairs = args
            .values
            .iter()
            .map(|raw| split_pair(raw, "--value").map(|(c, v)| (c, parse_literal(v))))
            .collect::<Result<Vec<_>>>()?;
        builder = match operation {
            Operation::Update => builder.set(pairs),
            _ => builder.values(pairs),
        };
    }
    if let Some(returning) = &args.returning {
        builder = builder.returning(returning);
    }

    let (sql, bound) = builder.build().context("Failed to build statement")?;
    debug!(sql = %sql, args = bound.len(), "rendered statement");
    Ok(Rendered { sql, args: bound })
}
