// Constants for the Forge code generator

/// File extension every loadable module must carry
pub const SOURCE_EXTENSION: &str = "forge";

/// Aggregating runtime header included by every generated unit
pub const RUNTIME_HEADER: &str = "forge_runtime.h";

/// Module search directories, relative to the working directory
pub const DEFAULT_SEARCH_PATHS: &[&str] = &[".", "modules", "lib"];

/// Environment variable holding extra module directories (platform path-list syntax)
pub const SEARCH_PATH_ENV: &str = "FORGE_PATH";

/// Size of the scratch buffer a non-string operand is formatted into before
/// string concatenation
pub const NUMBER_BUFFER_SIZE: usize = 64;

/// Prefix for generator-introduced temporaries; user identifiers never start
/// with a double underscore after sanitizing
pub const TEMP_PREFIX: &str = "__";

/// Prefix applied to identifiers that collide with C keywords or runtime names
pub const SANITIZE_PREFIX: &str = "forge_";

/// Identifiers that cannot be emitted verbatim
pub const RESERVED_NAMES: &[&str] = &[
    "auto", "case", "char", "const", "default", "do", "double", "enum", "extern", "goto", "long",
    "register", "short", "signed", "sizeof", "static", "switch", "typedef", "union", "unsigned",
    "void", "volatile", "int", "float", "struct", "main", "pow", "sqrt", "floor", "ceil", "round",
    "exit", "free", "malloc", "printf", "strlen", "time", "rand", "srand", "List", "StringList",
    "Array",
];

/// Externs whose second argument (index 1) is a socket address and needs an
/// explicit `struct sockaddr*` cast
pub const SOCKADDR_EXTERNS: &[&str] = &["bind", "connect", "accept"];

/// System headers included ahead of the runtime header
pub const SYSTEM_INCLUDES: &[&str] = &[
    "stdio.h", "stdlib.h", "string.h", "stdint.h", "math.h", "time.h", "setjmp.h",
];

/// POSIX socket headers, guarded so the unit still builds on Windows
pub const SOCKET_INCLUDES: &[&str] = &["sys/socket.h", "netinet/in.h", "arpa/inet.h", "unistd.h"];
