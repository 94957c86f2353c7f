//! Mapping from native column types onto the host's scalar types.
//!
//! | Native category | Host type |
//! |---|---|
//! | binary, bit, enum, string, uuid | `STRING` |
//! | boolean | `BOOL` |
//! | decimal, float, currency | `DOUBLE` |
//! | integer | `INT` |
//! | json | `JSON` |
//! | time, interval | `TIMESTAMP` |
//! | network host address | `INET` |
//! | network block | `CIDR` |
//! | everything else | `UNKNOWN` |

use crate::model::{ColumnTypeDescriptor, HostType, NativeType, NetworkKind};

/// Map a column's native type to the host type it is exposed as.
///
/// Total: anything without a faithful host representation maps to
/// [`HostType::Unknown`], which callers treat as "drop this column".
pub fn map_type(descriptor: &ColumnTypeDescriptor) -> HostType {
    match &descriptor.native {
        NativeType::Binary
        | NativeType::Bit
        | NativeType::Enum
        | NativeType::String
        | NativeType::Uuid => HostType::String,
        NativeType::Boolean => HostType::Bool,
        NativeType::Decimal | NativeType::Float | NativeType::Currency => HostType::Double,
        NativeType::Integer => HostType::Int,
        NativeType::Json => HostType::Json,
        NativeType::Time | NativeType::Interval => HostType::Timestamp,
        NativeType::Network(NetworkKind::Host) => HostType::Inet,
        NativeType::Network(NetworkKind::Block) => HostType::Cidr,
        NativeType::Network(NetworkKind::Other(_)) => HostType::Unknown,
        NativeType::Spatial
        | NativeType::TextSearch
        | NativeType::Array
        | NativeType::Serial
        | NativeType::ObjectId
        | NativeType::Range
        | NativeType::UserDefined
        | NativeType::Xml
        | NativeType::Unsupported => HostType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(native: NativeType) -> HostType {
        map_type(&ColumnTypeDescriptor::new(native, "raw"))
    }

    #[test]
    fn test_string_like_types() {
        for native in [
            NativeType::Binary,
            NativeType::Bit,
            NativeType::Enum,
            NativeType::String,
            NativeType::Uuid,
        ] {
            assert_eq!(host(native), HostType::String);
        }
    }

    #[test]
    fn test_numeric_types() {
        assert_eq!(host(NativeType::Integer), HostType::Int);
        assert_eq!(host(NativeType::Decimal), HostType::Double);
        assert_eq!(host(NativeType::Float), HostType::Double);
        assert_eq!(host(NativeType::Currency), HostType::Double);
    }

    #[test]
    fn test_scalar_types() {
        assert_eq!(host(NativeType::Boolean), HostType::Bool);
        assert_eq!(host(NativeType::Json), HostType::Json);
        assert_eq!(host(NativeType::Time), HostType::Timestamp);
        assert_eq!(host(NativeType::Interval), HostType::Timestamp);
    }

    #[test]
    fn test_network_subtypes() {
        assert_eq!(host(NativeType::Network(NetworkKind::Host)), HostType::Inet);
        assert_eq!(host(NativeType::Network(NetworkKind::Block)), HostType::Cidr);
        assert_eq!(
            host(NativeType::Network(NetworkKind::Other("macaddr".to_string()))),
            HostType::Unknown
        );
    }

    #[test]
    fn test_unrepresentable_types_are_unknown() {
        for native in [
            NativeType::Spatial,
            NativeType::TextSearch,
            NativeType::Array,
            NativeType::Serial,
            NativeType::ObjectId,
            NativeType::Range,
            NativeType::UserDefined,
            NativeType::Xml,
            NativeType::Unsupported,
        ] {
            assert_eq!(host(native), HostType::Unknown);
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let d = ColumnTypeDescriptor::new(NativeType::Decimal, "numeric(10,2)");
        assert_eq!(map_type(&d), map_type(&d.clone()));
    }
}
