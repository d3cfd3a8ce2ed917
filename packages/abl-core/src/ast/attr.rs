//! Node attribute keys and values.

/// Store type of a record node; values are [`crate::schema::StoreType`] codes.
pub const STORETYPE: i32 = 1100;
pub const OPERATOR: i32 = 1200;
pub const STATE2: i32 = 1300;
/// Set to [`TRUE`] on the first node of a statement.
pub const STATEHEAD: i32 = 1400;
pub const PROPARSEDIRECTIVE: i32 = 1500;
pub const ABBREVIATED: i32 = 1700;
pub const INLINE_VAR_DEF: i32 = 2000;
pub const QUALIFIED_CLASS_INT: i32 = 2400;

/// String table index of a node's text.
pub const NODETEXT: i32 = 49001;
/// String table index of a node's comments.
pub const NODECOMMENTS: i32 = 49002;

pub const TRUE: i32 = 1;
pub const FALSE: i32 = 0;

/// Keys whose persisted value is a string table index.
pub fn is_string_key(key: i32) -> bool {
    matches!(
        key,
        NODETEXT | NODECOMMENTS | PROPARSEDIRECTIVE | QUALIFIED_CLASS_INT
    )
}
