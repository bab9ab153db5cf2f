//! UTF-8 well-formedness checking, used by the code-point iterator's strict
//! mode (§4.1).

use crate::error::DecodeErr;
use crate::helpers::*;

fn bytes_remaining(code_unit: &CodeUnit) -> usize {
    match code_unit {
        CodeUnit::SingleByte => 0,
        CodeUnit::DoublePrefix => 1,
        CodeUnit::TriplePrefix => 2,
        CodeUnit::QuadPrefix => 3,
        CodeUnit::Continuation => unreachable!(),
    }
}

/// Checks `input` is well-formed UTF-8. On failure, returns the decode error
/// together with the byte offset at which the offending sequence starts.
pub fn validate(input: &[u8]) -> Result<(), (DecodeErr, usize)> {
    let mut pos = 0;
    let len = input.len();
    while pos < len {
        let code_unit = CodeUnit::try_from(input[pos]).map_err(|e| (e, pos))?;
        match code_unit {
            CodeUnit::SingleByte => pos += 1,
            CodeUnit::Continuation => return Err((DecodeErr::UnexpectedContinuation, pos)),
            _ => {
                let remaining = bytes_remaining(&code_unit);
                if pos + remaining >= len {
                    return Err((DecodeErr::IncompleteCharacter, pos));
                }
                for i in 1..=remaining {
                    if !matches!(CodeUnit::try_from(input[pos + i]), Ok(CodeUnit::Continuation)) {
                        return Err((DecodeErr::IncompleteCharacter, pos));
                    }
                }
                let code_point = match code_unit {
                    CodeUnit::DoublePrefix => decode_double(input[pos], input[pos + 1]),
                    CodeUnit::TriplePrefix => {
                        decode_triple(input[pos], input[pos + 1], input[pos + 2])
                    }
                    CodeUnit::QuadPrefix => {
                        decode_quad(input[pos], input[pos + 1], input[pos + 2], input[pos + 3])
                    }
                    _ => unreachable!(),
                };
                let min_code_point = match code_unit {
                    CodeUnit::DoublePrefix => 0x80,
                    CodeUnit::TriplePrefix => 0x800,
                    CodeUnit::QuadPrefix => 0x10000,
                    _ => unreachable!(),
                };
                if code_point < min_code_point {
                    return Err((DecodeErr::OverlongEncoding(code_point), pos));
                }
                if !is_valid_codepoint(code_point) {
                    return Err((DecodeErr::InvalidCodePoint, pos));
                }
                pos += 1 + remaining;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ok() {
        assert!(validate(b"hello").is_ok());
        assert!(validate("ศไทย中华Việt Nam".as_bytes()).is_ok());
        assert!(validate("👨‍👩‍👧‍👧".as_bytes()).is_ok());
    }

    #[test]
    fn test_validate_unexpected_continuation() {
        assert_eq!(
            validate(&[0x80]),
            Err((DecodeErr::UnexpectedContinuation, 0))
        );
    }

    #[test]
    fn test_validate_incomplete() {
        assert_eq!(validate(&[0xC2]), Err((DecodeErr::IncompleteCharacter, 0)));
        assert_eq!(
            validate(&[0xE0, 0xA0]),
            Err((DecodeErr::IncompleteCharacter, 0))
        );
    }

    #[test]
    fn test_validate_overlong() {
        assert_eq!(
            validate(&[0xC0, 0x80]),
            Err((DecodeErr::OverlongEncoding(0), 0))
        );
    }

    #[test]
    fn test_validate_surrogate() {
        // 0xED 0xA0 0x80 decodes to 0xD800, a surrogate half.
        assert_eq!(
            validate(&[0xED, 0xA0, 0x80]),
            Err((DecodeErr::InvalidCodePoint, 0))
        );
    }

    #[test]
    fn test_validate_invalid_code_unit() {
        assert_eq!(validate(&[0xFF]), Err((DecodeErr::InvalidCodeUnit, 0)));
    }
}
