use thiserror::Error;

/// UTF-8 byte-level decode failure, located at the byte offset where the
/// offending sequence starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErr {
    InvalidCodeUnit,
    UnexpectedContinuation,
    IncompleteCharacter,
    /// Carries the code point that was encoded using more bytes than
    /// necessary, so a caller repairing the input can re-encode it minimally
    /// instead of discarding it outright.
    OverlongEncoding(u32),
    InvalidCodePoint,
}

/// Crate-wide error type. Table lookups are total (§7: "lookup functions
/// never fail") so this only ever surfaces from the UTF-8 decode boundary,
/// from padding helpers that take an explicit width budget, or from the
/// allocator.
#[derive(Debug, Error)]
pub enum UnicodeCoreError {
    #[error("invalid utf-8 at byte {offset}: {kind:?}")]
    InvalidUtf8 { kind: DecodeErr, offset: usize },

    #[error("string exceeds the maximum permitted column width")]
    StrTooLong,

    #[error("padded output exceeds the maximum permitted column width")]
    PadTooLong,

    /// Surfaced only in principle: std's global allocator aborts the
    /// process on allocation failure rather than unwinding, so this variant
    /// exists to satisfy §7's propagation policy without being reachable.
    #[error("allocation failure")]
    AllocationFailure,
}
