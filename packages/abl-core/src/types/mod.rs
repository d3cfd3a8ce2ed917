//! Primitive data types of the source language.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ast::node_type as nt;
use crate::error::ProparseError;

/// Primitive data type of a field, variable, or symbol.
///
/// Each data type maps to the node type code of its keyword, which is the
/// code stored in parse-unit binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    BigInt,
    Blob,
    Byte,
    Character,
    Class,
    Clob,
    ComHandle,
    Date,
    DateTime,
    DateTimeTz,
    Decimal,
    Double,
    FixChar,
    Float,
    Handle,
    Integer,
    Int64,
    Long,
    LongChar,
    Logical,
    Memptr,
    Numeric,
    Raw,
    Recid,
    Rowid,
    Short,
    Time,
    Timestamp,
    UnsignedShort,
    WidgetHandle,
}

const ALL: [DataType; 30] = [
    DataType::BigInt,
    DataType::Blob,
    DataType::Byte,
    DataType::Character,
    DataType::Class,
    DataType::Clob,
    DataType::ComHandle,
    DataType::Date,
    DataType::DateTime,
    DataType::DateTimeTz,
    DataType::Decimal,
    DataType::Double,
    DataType::FixChar,
    DataType::Float,
    DataType::Handle,
    DataType::Integer,
    DataType::Int64,
    DataType::Long,
    DataType::LongChar,
    DataType::Logical,
    DataType::Memptr,
    DataType::Numeric,
    DataType::Raw,
    DataType::Recid,
    DataType::Rowid,
    DataType::Short,
    DataType::Time,
    DataType::Timestamp,
    DataType::UnsignedShort,
    DataType::WidgetHandle,
];

impl DataType {
    /// Upper-case language name, ex: "COM-HANDLE".
    pub fn progress_name(self) -> &'static str {
        match self {
            DataType::BigInt => "BIGINT",
            DataType::Blob => "BLOB",
            DataType::Byte => "BYTE",
            DataType::Character => "CHARACTER",
            DataType::Class => "CLASS",
            DataType::Clob => "CLOB",
            DataType::ComHandle => "COM-HANDLE",
            DataType::Date => "DATE",
            DataType::DateTime => "DATETIME",
            DataType::DateTimeTz => "DATETIME-TZ",
            DataType::Decimal => "DECIMAL",
            DataType::Double => "DOUBLE",
            DataType::FixChar => "FIXCHAR",
            DataType::Float => "FLOAT",
            DataType::Handle => "HANDLE",
            DataType::Integer => "INTEGER",
            DataType::Int64 => "INT64",
            DataType::Long => "LONG",
            DataType::LongChar => "LONGCHAR",
            DataType::Logical => "LOGICAL",
            DataType::Memptr => "MEMPTR",
            DataType::Numeric => "NUMERIC",
            DataType::Raw => "RAW",
            DataType::Recid => "RECID",
            DataType::Rowid => "ROWID",
            DataType::Short => "SHORT",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::UnsignedShort => "UNSIGNED-SHORT",
            DataType::WidgetHandle => "WIDGET-HANDLE",
        }
    }

    /// Node type code of the data type keyword.
    pub fn token_type(self) -> i32 {
        match self {
            DataType::BigInt => nt::BIGINT,
            DataType::Blob => nt::BLOB,
            DataType::Byte => nt::BYTE,
            DataType::Character => nt::CHARACTER,
            DataType::Class => nt::CLASS,
            DataType::Clob => nt::CLOB,
            DataType::ComHandle => nt::COMHANDLE,
            DataType::Date => nt::DATE,
            DataType::DateTime => nt::DATETIME,
            DataType::DateTimeTz => nt::DATETIMETZ,
            DataType::Decimal => nt::DECIMAL,
            DataType::Double => nt::DOUBLE,
            DataType::FixChar => nt::FIXCHAR,
            DataType::Float => nt::FLOAT,
            DataType::Handle => nt::HANDLE,
            DataType::Integer => nt::INTEGER,
            DataType::Int64 => nt::INT64,
            DataType::Long => nt::LONG,
            DataType::LongChar => nt::LONGCHAR,
            DataType::Logical => nt::LOGICAL,
            DataType::Memptr => nt::MEMPTR,
            DataType::Numeric => nt::NUMERIC,
            DataType::Raw => nt::RAW,
            DataType::Recid => nt::RECID,
            DataType::Rowid => nt::ROWID,
            DataType::Short => nt::SHORT,
            DataType::Time => nt::TIME,
            DataType::Timestamp => nt::TIMESTAMP,
            DataType::UnsignedShort => nt::UNSIGNEDSHORT,
            DataType::WidgetHandle => nt::WIDGETHANDLE,
        }
    }

    /// Returns the data type for a node type code, if it names one.
    pub fn from_token_type(token_type: i32) -> Option<Self> {
        ALL.iter().copied().find(|dt| dt.token_type() == token_type)
    }

    /// Looks up a data type by its language name, ignoring case.
    ///
    /// Abbreviations are not accepted.
    pub fn from_progress_name(name: &str) -> Option<Self> {
        ALL.iter()
            .copied()
            .find(|dt| dt.progress_name().eq_ignore_ascii_case(name))
    }

    /// Whether values of this type are object references.
    pub fn is_class(self) -> bool {
        self == DataType::Class
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.progress_name())
    }
}

impl FromStr for DataType {
    type Err = ProparseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_progress_name(s.trim()).ok_or_else(|| ProparseError::UnknownDataType {
            name: s.to_string(),
        })
    }
}
