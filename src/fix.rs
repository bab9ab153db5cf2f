//! UTF-8 repair: replaces each ill-formed subsequence with U+FFFD following
//! the maximal-subpart rule, except for overlong encodings, which are
//! re-encoded at their minimal length instead of being discarded (§4.1).

use crate::error::DecodeErr;
use crate::helpers::*;
use crate::validate::validate;

const REPLACEMENT: &[u8] = &[0xEF, 0xBF, 0xBD];

pub fn fix(input: Vec<u8>) -> Vec<u8> {
    match validate(&input) {
        Ok(_) => input,
        Err(_) => {
            let mut fixed = Vec::with_capacity(input.len());
            let len = input.len();
            let mut pos = 0;

            while let Err((decode_err, rel_err_pos)) = validate(&input[pos..len]) {
                let err_pos = rel_err_pos + pos;
                fixed.extend_from_slice(&input[pos..err_pos]);
                pos = err_pos;
                match decode_err {
                    DecodeErr::InvalidCodeUnit => {
                        fixed.extend_from_slice(REPLACEMENT);
                        pos += 1;
                    }
                    DecodeErr::IncompleteCharacter => {
                        fixed.extend_from_slice(REPLACEMENT);
                        let code_unit = CodeUnit::try_from(input[pos]).unwrap();
                        let expected_continuations = &input[(pos + 1)..(pos + code_unit.len()).min(len)];
                        let end = expected_continuations
                            .iter()
                            .position(|c_u| CodeUnit::try_from(*c_u) != Ok(CodeUnit::Continuation))
                            .unwrap_or(expected_continuations.len());
                        pos += 1 + end;
                    }
                    DecodeErr::InvalidCodePoint => {
                        fixed.extend_from_slice(REPLACEMENT);
                        let code_unit = CodeUnit::try_from(input[pos]).unwrap();
                        pos += code_unit.len();
                    }
                    DecodeErr::OverlongEncoding(code_point) => {
                        fixed.extend_from_slice(&encode_utf8(code_point));
                        let code_unit = CodeUnit::try_from(input[pos]).unwrap();
                        pos += code_unit.len();
                    }
                    DecodeErr::UnexpectedContinuation => {
                        fixed.extend_from_slice(REPLACEMENT);
                        pos += 1;
                    }
                }
            }
            fixed.extend_from_slice(&input[pos..len]);
            fixed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_overlong_is_reencoded() {
        assert_eq!(fix(vec![0xc0, 0x80]), vec![0x0]);
        assert_eq!(fix(vec![0xc0, 0xAE]), vec![0x2E]);
    }

    #[test]
    fn test_fix_incomplete_quad() {
        assert_eq!(
            fix(vec![0xF0, 0x80, 0x80, 0x41]),
            vec![0xEF, 0xBF, 0xBD, 0x41]
        );
    }

    #[test]
    fn test_fix_already_valid_is_unchanged() {
        let xs = b"hello".to_vec();
        assert_eq!(fix(xs), b"hello");

        let xs = "ศไทย中华Việt Nam".as_bytes().to_vec();
        let ys = "ศไทย中华Việt Nam".as_bytes();
        assert_eq!(fix(xs), ys);
    }

    #[test]
    fn test_fix_scattered_errors() {
        let xs = b"Hello\xC2 There\xFF Goodbye".to_vec();
        let ys = "Hello\u{FFFD} There\u{FFFD} Goodbye".as_bytes();
        assert_eq!(fix(xs), ys);
    }

    #[test]
    fn test_fix_unexpected_continuation() {
        let xs = vec![0x41, 0x80, 0x42];
        assert_eq!(fix(xs), vec![0x41, 0xEF, 0xBF, 0xBD, 0x42]);
    }
}
