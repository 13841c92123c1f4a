//! Server error codes the driver does not name.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

/// A unique index rejected the write.
pub const DUPLICATE_KEY: i32 = 11000;

/// Did a unique index reject this write?
///
/// Inside a transaction the server may report the clash as a command error
/// rather than a write error, so both are checked.
pub fn is_duplicate_key_error(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(ref e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
