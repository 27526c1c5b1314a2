//! Error types for planning and building packed regions.

use thiserror::Error;

/// Reasons a list of sequence descriptors cannot be turned into a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// No sequences were described.
    #[error("no sequences were described")]
    Empty,
    /// An element alignment is not a power of two.
    #[error("alignment {0} is not a power of two")]
    InvalidAlignment(usize),
    /// Summing element sizes and padding overflowed `usize`.
    #[error("combined layout size overflows usize")]
    Overflow,
    /// The combined region would exceed `isize::MAX` bytes.
    #[error("combined layout of {0} bytes exceeds isize::MAX")]
    TooLarge(usize),
    /// The number of counts does not match the number of element types.
    #[error("expected {expected} sequence counts, got {found}")]
    ArityMismatch {
        /// Element types in the list.
        expected: usize,
        /// Counts supplied.
        found: usize,
    },
}

/// Failure of a packed allocation.
///
/// `E` is the caller's element construction error. It is carried unchanged;
/// every already-constructed element has been destroyed and the region
/// returned to its source by the time this value is observed.
#[derive(Debug, Error)]
pub enum PackError<E> {
    /// The descriptors do not form a valid layout. Nothing was allocated.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// The memory source refused the single combined request. Nothing was constructed.
    #[error("memory source could not supply {bytes} bytes aligned to {align}")]
    OutOfMemory {
        /// Bytes requested.
        bytes: usize,
        /// Alignment requested.
        align: usize,
    },
    /// An element constructor failed.
    #[error("constructing element {element} of sequence {sequence} failed")]
    Construction {
        /// Index of the sequence in the type list.
        sequence: usize,
        /// Index of the failing element within the sequence.
        element: usize,
        /// The constructor's own error.
        #[source]
        source: E,
    },
    /// An input iterator ran dry before every element was constructed.
    #[error("input for sequence {sequence} ended after {produced} of {expected} elements")]
    InputExhausted {
        /// Index of the sequence in the type list.
        sequence: usize,
        /// Elements requested.
        expected: usize,
        /// Elements the input actually yielded.
        produced: usize,
    },
}

impl<E> PackError<E> {
    /// Returns the constructor's error if this is a construction failure.
    pub fn into_construction(self) -> Option<E> {
        match self {
            Self::Construction { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the memory source refused the request.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}
