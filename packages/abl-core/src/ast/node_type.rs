//! Node type codes and their default text.
//!
//! A node whose text equals the default text of its type does not need to
//! carry the text explicitly in a parse-unit binary.

macro_rules! node_types {
    ($($name:ident = $code:literal => $text:expr;)*) => {
        $(pub const $name: i32 = $code;)*

        /// Returns the keyword text a node of this type carries by default.
        pub fn default_text(node_type: i32) -> Option<&'static str> {
            match node_type {
                $($code => $text,)*
                _ => None,
            }
        }

        /// Returns the symbolic name of a node type.
        pub fn type_name(node_type: i32) -> Option<&'static str> {
            match node_type {
                $($code => Some(stringify!($name)),)*
                _ => None,
            }
        }
    };
}

node_types! {
    PROGRAM_ROOT = 4 => None;
    PROGRAM_TAIL = 5 => None;
    CODE_BLOCK = 6 => None;
    EXPR_STATEMENT = 7 => None;
    FIELD_REF = 8 => None;
    RECORD_NAME = 9 => None;
    TYPE_NAME = 10 => None;
    WIDGET_REF = 11 => None;
    ID = 12 => None;
    NUMBER = 13 => None;
    QSTRING = 14 => None;
    PERIOD = 15 => Some(".");
    LEFTPAREN = 16 => Some("(");
    RIGHTPAREN = 17 => Some(")");
    COMMA = 18 => Some(",");
    LEXCOLON = 19 => Some(":");
    EQUAL = 20 => Some("=");
    PLUS = 21 => Some("+");
    MINUS = 22 => Some("-");
    STAR = 23 => Some("*");
    SLASH = 24 => Some("/");
    DEFINE = 30 => Some("define");
    VARIABLE = 31 => Some("variable");
    AS = 32 => Some("as");
    LIKE = 33 => Some("like");
    INITIAL = 34 => Some("initial");
    NOUNDO = 35 => Some("no-undo");
    BUFFER = 36 => Some("buffer");
    FOR = 37 => Some("for");
    TEMPTABLE = 38 => Some("temp-table");
    WORKTABLE = 39 => Some("work-table");
    FIELD = 40 => Some("field");
    INDEX = 41 => Some("index");
    PARAMETER = 42 => Some("parameter");
    INPUT = 43 => Some("input");
    OUTPUT = 44 => Some("output");
    PROCEDURE = 45 => Some("procedure");
    FUNCTION = 46 => Some("function");
    RETURNS = 47 => Some("returns");
    METHOD = 48 => Some("method");
    CLASS = 49 => Some("class");
    INHERITS = 50 => Some("inherits");
    INTERFACE = 51 => Some("interface");
    ENUM = 52 => Some("enum");
    END = 53 => Some("end");
    FIND = 54 => Some("find");
    FIRST = 55 => Some("first");
    LAST = 56 => Some("last");
    EACH = 57 => Some("each");
    WHERE = 58 => Some("where");
    NOLOCK = 59 => Some("no-lock");
    DISPLAY = 60 => Some("display");
    ASSIGN = 61 => Some("assign");
    IF = 62 => Some("if");
    THEN = 63 => Some("then");
    ELSE = 64 => Some("else");
    DO = 65 => Some("do");
    RUN = 66 => Some("run");
    RETURN = 67 => Some("return");
    MESSAGE = 68 => Some("message");
    USING = 69 => Some("using");
    PROPARSEDIRECTIVE = 70 => None;
    INCLUDEDIRECTIVE = 71 => None;
    BIGINT = 100 => Some("bigint");
    BLOB = 101 => Some("blob");
    BYTE = 102 => Some("byte");
    CHARACTER = 103 => Some("character");
    CLOB = 104 => Some("clob");
    COMHANDLE = 105 => Some("com-handle");
    DATE = 106 => Some("date");
    DATETIME = 107 => Some("datetime");
    DATETIMETZ = 108 => Some("datetime-tz");
    DECIMAL = 109 => Some("decimal");
    DOUBLE = 110 => Some("double");
    FIXCHAR = 111 => Some("fixchar");
    FLOAT = 112 => Some("float");
    HANDLE = 113 => Some("handle");
    INTEGER = 114 => Some("integer");
    INT64 = 115 => Some("int64");
    LONG = 116 => Some("long");
    LONGCHAR = 117 => Some("longchar");
    LOGICAL = 118 => Some("logical");
    MEMPTR = 119 => Some("memptr");
    NUMERIC = 120 => Some("numeric");
    RAW = 121 => Some("raw");
    RECID = 122 => Some("recid");
    ROWID = 123 => Some("rowid");
    SHORT = 124 => Some("short");
    TIME = 125 => Some("time");
    TIMESTAMP = 126 => Some("timestamp");
    UNSIGNEDSHORT = 127 => Some("unsigned-short");
    WIDGETHANDLE = 128 => Some("widget-handle");
}
