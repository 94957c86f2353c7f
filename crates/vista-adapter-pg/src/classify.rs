//! Classification of Postgres catalog types into native type categories.

use vista_core::{NativeType, NetworkKind};

/// Catalog facts about one column, as read from `pg_attribute`/`pg_type`.
#[derive(Debug, Clone, Default)]
pub struct PgColumnType<'a> {
    /// `pg_type.typname`, e.g. `int4`, `varchar`, `_text`.
    pub type_name: &'a str,
    /// `pg_type.typtype`: `b` base, `c` composite, `d` domain, `e` enum,
    /// `p` pseudo, `r` range, `m` multirange.
    pub type_kind: &'a str,
    /// `pg_type.typcategory`, e.g. `A` for arrays.
    pub type_category: &'a str,
    /// Default expression, if any.
    pub default: Option<&'a str>,
    /// `pg_attribute.attidentity`: empty, `a` (always) or `d` (by default).
    pub identity: &'a str,
}

pub fn classify(col: &PgColumnType<'_>) -> NativeType {
    match col.type_kind {
        "e" => return NativeType::Enum,
        "r" | "m" => return NativeType::Range,
        "c" | "d" | "p" => return NativeType::UserDefined,
        _ => {}
    }
    if col.type_category == "A" {
        return NativeType::Array;
    }

    match col.type_name {
        "int2" | "int4" | "int8" => {
            if is_serial(col) {
                NativeType::Serial
            } else {
                NativeType::Integer
            }
        }
        "numeric" => NativeType::Decimal,
        "float4" | "float8" => NativeType::Float,
        "money" => NativeType::Currency,
        "bool" => NativeType::Boolean,
        "text" | "varchar" | "bpchar" | "char" | "name" | "citext" => NativeType::String,
        "bytea" => NativeType::Binary,
        "bit" | "varbit" => NativeType::Bit,
        "uuid" => NativeType::Uuid,
        "json" | "jsonb" => NativeType::Json,
        "date" | "time" | "timetz" | "timestamp" | "timestamptz" => NativeType::Time,
        "interval" => NativeType::Interval,
        "inet" => NativeType::Network(NetworkKind::Host),
        "cidr" => NativeType::Network(NetworkKind::Block),
        "macaddr" | "macaddr8" => NativeType::Network(NetworkKind::Other(col.type_name.to_string())),
        "tsvector" | "tsquery" => NativeType::TextSearch,
        "xml" => NativeType::Xml,
        "oid" | "regclass" | "regcollation" | "regconfig" | "regdictionary" | "regnamespace"
        | "regoper" | "regoperator" | "regproc" | "regprocedure" | "regrole" | "regtype" => {
            NativeType::ObjectId
        }
        "point" | "line" | "lseg" | "box" | "path" | "polygon" | "circle" | "geometry"
        | "geography" => NativeType::Spatial,
        _ => NativeType::Unsupported,
    }
}

fn is_serial(col: &PgColumnType<'_>) -> bool {
    !col.identity.is_empty()
        || col
            .default
            .is_some_and(|d| d.trim_start().starts_with("nextval("))
}
