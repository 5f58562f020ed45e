//! C runtime support for generated programs
//!
//! Every generated unit includes [`RUNTIME_HEADER`], which pulls in the other
//! headers. They are embedded in the binary and written next to the C file
//! before the C compiler runs.
//!
//! | Header | Provides |
//! |---|---|
//! | `forge_runtime.h` | string helpers, conversions, random numbers, hashing, `make_sockaddr` |
//! | `forge_exception.h` | the checkpoint stack behind `attempt`/`rescue`, `forge_raise` |
//! | `forge_list.h` | `List` (doubles) and `StringList` |
//! | `forge_array.h` | `Array` with a fixed element size |
//! | `forge_fileio.h` | `read_file`, `write_file` |

use crate::codegen::constants::RUNTIME_HEADER;
use std::fs;
use std::io;
use std::path::Path;

/// Every runtime header as `(file name, contents)`
pub const HEADERS: &[(&str, &str)] = &[
    (RUNTIME_HEADER, include_str!("forge_runtime.h")),
    ("forge_exception.h", include_str!("forge_exception.h")),
    ("forge_list.h", include_str!("forge_list.h")),
    ("forge_array.h", include_str!("forge_array.h")),
    ("forge_fileio.h", include_str!("forge_fileio.h")),
];

/// Write all runtime headers into `dir`, replacing existing copies.
pub fn write_headers(dir: &Path) -> io::Result<()> {
    for (name, contents) in HEADERS {
        log::trace!("writing runtime header {}", name);
        fs::write(dir.join(name), contents)?;
    }
    Ok(())
}
