use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{
    MySql, MySqlPool,
    mysql::MySqlArguments,
    query::{QueryAs, QueryScalar},
};

use crate::error::{AppError, FieldErrors};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// A column that may be patched, and the JSON shape it accepts.
#[derive(Debug, Clone, Copy)]
pub enum Column {
    Text(&'static str),
    NullableText(&'static str),
    Id(&'static str),
    NullableId(&'static str),
    NullableDate(&'static str),
    Bool(&'static str),
}

impl Column {
    fn name(&self) -> &'static str {
        match *self {
            Column::Text(n)
            | Column::NullableText(n)
            | Column::Id(n)
            | Column::NullableId(n)
            | Column::NullableDate(n)
            | Column::Bool(n) => n,
        }
    }

    fn convert(&self, value: &Value) -> Result<SqlValue, &'static str> {
        let nullable = matches!(
            self,
            Column::NullableText(_) | Column::NullableId(_) | Column::NullableDate(_)
        );
        if value.is_null() {
            return if nullable { Ok(SqlValue::Null) } else { Err("must not be null") };
        }

        match self {
            Column::Text(_) | Column::NullableText(_) => match value.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(SqlValue::String(s.trim().to_string())),
                Some(_) => Err("must not be empty"),
                None => Err("must be a string"),
            },
            Column::Id(_) | Column::NullableId(_) => {
                value.as_u64().map(SqlValue::U64).ok_or("must be a positive integer")
            }
            Column::NullableDate(_) => value
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .map(SqlValue::Date)
                .ok_or("must be a YYYY-MM-DD date"),
            Column::Bool(_) => value.as_bool().map(SqlValue::Bool).ok_or("must be a boolean"),
        }
    }
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `columns` are accepted; anything else is reported as a
/// field error instead of being spliced into the statement.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    columns: &[Column],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Payload must be a JSON object".to_string()))?;

    if obj.is_empty() {
        return Err(AppError::BadRequest("No fields provided for update".to_string()));
    }

    let mut errors = FieldErrors::new();
    let mut assignments = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let Some(column) = columns.iter().find(|c| c.name() == key) else {
            errors
                .entry(key.clone())
                .or_default()
                .push("field cannot be updated".to_string());
            continue;
        };

        match column.convert(value) {
            Ok(v) => {
                assignments.push(format!("{} = ?", column.name()));
                values.push(v);
            }
            Err(message) => errors.entry(key.clone()).or_default().push(message.to_string()),
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        assignments.join(", "),
        id_column
    );

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Typed value for the dynamic WHERE clauses of list endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    U64(u64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
}

pub fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    args: &'q [FilterValue],
) -> QueryScalar<'q, MySql, O, MySqlArguments> {
    for arg in args {
        query = match arg {
            FilterValue::U64(v) => query.bind(*v),
            FilterValue::Bool(v) => query.bind(*v),
            FilterValue::Str(v) => query.bind(v.as_str()),
            FilterValue::Date(v) => query.bind(*v),
        };
    }
    query
}

pub fn bind_as<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    args: &'q [FilterValue],
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for arg in args {
        query = match arg {
            FilterValue::U64(v) => query.bind(*v),
            FilterValue::Bool(v) => query.bind(*v),
            FilterValue::Str(v) => query.bind(v.as_str()),
            FilterValue::Date(v) => query.bind(*v),
        };
    }
    query
}

/// Page and page size from optional query values (1-based, capped at 100).
pub fn paginate(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> (u32, u32, u64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(default_per_page).clamp(1, 100);
    let offset = u64::from(page - 1) * u64::from(per_page);
    (page, per_page, offset)
}
