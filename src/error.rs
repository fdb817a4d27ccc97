use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure mode of mapping extraction falls into one of two groups: format violations in
/// the precomputed artifact (fatal for the current load, since continuing could silently produce
/// an AOT image with wrong runtime behavior) and symbol-universe failures reported while
/// resolving embedded references.
///
/// The type is [`Clone`] on purpose: the lazily computed mapping snapshot memoizes its outcome,
/// and a failed load must hand the same error to every caller that forces the cache.
///
/// # Error Categories
///
/// ## Format Violations
/// - [`Error::Malformed`] - The instruction stream or method body does not match the record grammar
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the stream
/// - [`Error::Empty`] - Empty input provided where a method body was expected
///
/// ## Symbol Resolution Errors
/// - [`Error::SymbolNotFound`] - A token embedded in the stream has no symbol behind it
/// - [`Error::TypeError`] - Generic instantiation or type-system query failure
///
/// # Examples
///
/// ```rust
/// use aotmeta::{Error, metadata::method::MethodBody};
///
/// match MethodBody::from(&[]) {
///     Ok(_) => unreachable!(),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed body: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The precomputed artifact is damaged and could not be decoded.
    ///
    /// This error indicates that an instruction stream, method body, or decoded table does not
    /// conform to the expected mapping record format. The error includes the source location
    /// where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding the stream.
    ///
    /// This error occurs when trying to read data beyond the end of a method body or
    /// instruction stream. It's a safety check to prevent buffer overruns during decoding.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    ///
    /// This error occurs when an empty buffer is provided where an actual CIL method body
    /// was expected.
    #[error("Provided input was empty")]
    Empty,

    /// Failed to resolve a token to a symbol.
    ///
    /// A `ldtoken` operand embedded in a mapping stream must resolve to a live type, method,
    /// or field in the symbol universe. Dead entries are encoded as literal zeros, never as
    /// unresolvable tokens, so this always indicates a corrupt or mismatched artifact.
    ///
    /// The associated [`Token`] identifies which reference failed to resolve.
    #[error("Failed to resolve token to a symbol - {0}")]
    SymbolNotFound(Token),

    /// General error during type system usage.
    ///
    /// Covers type-system operations that can fail during stub resolution, such as generic
    /// instantiation with a mismatched argument count.
    #[error("{0}")]
    TypeError(String),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories, such as internal consistency
    /// failures in the symbol universe.
    #[error("{0}")]
    Error(String),
}
