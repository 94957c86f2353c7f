use sqlx::{Connection, PgConnection, Row};
use std::collections::HashMap;
use vista_core::{ColumnModel, ColumnTypeDescriptor, Error, Result, TableModel};

use crate::classify::{PgColumnType, classify};

/// Introspect the ordinary and partitioned tables of one Postgres schema.
///
/// Columns come back in ordinal order with their native type, the formatted
/// type text and any comment attached with `COMMENT ON`.
pub async fn introspect_schema(database_url: &str, schema: &str) -> Result<Vec<TableModel>> {
    let mut conn = PgConnection::connect(database_url)
        .await
        .map_err(Error::connection)?;

    let tables = read_schema(&mut conn, schema).await;

    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "error closing introspection connection");
    }
    tables
}

async fn read_schema(conn: &mut PgConnection, schema: &str) -> Result<Vec<TableModel>> {
    let fail = |e: sqlx::Error| Error::introspection(schema, e);

    let (exists,): (bool,) = sqlx::query_as(
        "select exists(select 1 from pg_catalog.pg_namespace where nspname = $1)",
    )
    .bind(schema)
    .fetch_one(&mut *conn)
    .await
    .map_err(fail)?;
    if !exists {
        return Err(Error::introspection(
            schema,
            format!("schema \"{}\" does not exist", schema),
        ));
    }

    let table_rows = sqlx::query(
        r#"
        select c.relname as table_name,
               pg_catalog.obj_description(c.oid, 'pg_class') as table_comment
        from pg_catalog.pg_class c
        join pg_catalog.pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relkind in ('r', 'p')
        order by c.relname
        "#,
    )
    .bind(schema)
    .fetch_all(&mut *conn)
    .await
    .map_err(fail)?;

    let col_rows = sqlx::query(
        r#"
        select c.relname as table_name,
               a.attname as column_name,
               pg_catalog.format_type(a.atttypid, a.atttypmod) as raw_type,
               t.typname::text as type_name,
               t.typtype::text as type_kind,
               t.typcategory::text as type_category,
               pg_catalog.pg_get_expr(d.adbin, d.adrelid) as column_default,
               a.attidentity::text as identity,
               pg_catalog.col_description(c.oid, a.attnum) as column_comment
        from pg_catalog.pg_attribute a
        join pg_catalog.pg_class c on c.oid = a.attrelid
        join pg_catalog.pg_namespace n on n.oid = c.relnamespace
        join pg_catalog.pg_type t on t.oid = a.atttypid
        left join pg_catalog.pg_attrdef d on d.adrelid = a.attrelid and d.adnum = a.attnum
        where n.nspname = $1
          and c.relkind in ('r', 'p')
          and a.attnum > 0
          and not a.attisdropped
        order by c.relname, a.attnum
        "#,
    )
    .bind(schema)
    .fetch_all(&mut *conn)
    .await
    .map_err(fail)?;

    let mut columns: HashMap<String, Vec<ColumnModel>> = HashMap::new();
    for row in col_rows {
        let table_name: String = row.try_get("table_name").map_err(fail)?;
        let column_name: String = row.try_get("column_name").map_err(fail)?;
        let raw_type: String = row.try_get("raw_type").map_err(fail)?;
        let type_name: String = row.try_get("type_name").map_err(fail)?;
        let type_kind: String = row.try_get("type_kind").map_err(fail)?;
        let type_category: String = row.try_get("type_category").map_err(fail)?;
        let column_default: Option<String> = row.try_get("column_default").map_err(fail)?;
        let identity: String = row.try_get("identity").map_err(fail)?;
        let column_comment: Option<String> = row.try_get("column_comment").map_err(fail)?;

        let native = classify(&PgColumnType {
            type_name: &type_name,
            type_kind: &type_kind,
            type_category: &type_category,
            default: column_default.as_deref(),
            identity: &identity,
        });

        let mut column = ColumnModel::new(column_name, ColumnTypeDescriptor::new(native, raw_type));
        column.comment = column_comment;
        columns.entry(table_name).or_default().push(column);
    }

    let mut tables = Vec::with_capacity(table_rows.len());
    for row in table_rows {
        let name: String = row.try_get("table_name").map_err(fail)?;
        let comment: Option<String> = row.try_get("table_comment").map_err(fail)?;
        tables.push(TableModel {
            columns: columns.remove(&name).unwrap_or_default(),
            name,
            comment,
        });
    }

    tracing::debug!(%schema, tables = tables.len(), "introspected schema");
    Ok(tables)
}
