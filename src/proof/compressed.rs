//! Compressed-proof letter decoding (spec.md §4.6, §6), grounded
//! line-for-line on `original_source/getproof.cpp`'s
//! `getproofnumbers`/`addproofnumber`.

use crate::diag::{ProofShapeError, VerifyError, VerifyResult};

/// Decode a compressed-proof letter string into raw proof numbers.
///
/// `0` stands for a `Z` (save marker). Any other value is a 1-based
/// index into the combined mandatory-hypotheses-then-prefix-labels
/// list, or (past that list) one more than a load-step index — the
/// caller (`reader::Reader::read_compressed_proof`) performs that
/// final translation, since only it knows the label count.
pub fn decode(letters: &str, label: &str) -> VerifyResult<Vec<u32>> {
    let mut out = Vec::with_capacity(letters.len());
    let mut num: u32 = 0;
    let mut just_got_num = false;

    for ch in letters.chars() {
        match ch {
            'A'..='T' => {
                let digit = ch as u32 - 'A' as u32 + 1;
                num = checked_accum(num, 20, digit, label)?;
                out.push(num);
                num = 0;
                just_got_num = true;
            }
            'U'..='Y' => {
                let digit = ch as u32 - 'T' as u32;
                num = checked_accum(num, 5, digit, label)?;
                just_got_num = false;
            }
            'Z' => {
                if !just_got_num {
                    return Err(shape_err(label, ProofShapeError::StrayZ));
                }
                out.push(0);
                just_got_num = false;
            }
            other => return Err(shape_err(label, ProofShapeError::BogusLetter { letter: other })),
        }
    }

    if num != 0 {
        return Err(shape_err(label, ProofShapeError::UnfinishedNumber));
    }

    Ok(out)
}

fn checked_accum(num: u32, mul: u32, add: u32, label: &str) -> VerifyResult<u32> {
    num.checked_mul(mul)
        .and_then(|v| v.checked_add(add))
        .ok_or_else(|| shape_err(label, ProofShapeError::CompressedNumberOverflow))
}

fn shape_err(label: &str, kind: ProofShapeError) -> VerifyError {
    VerifyError::ProofShape { label: label.to_string(), kind }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_prefix_reference() {
        assert_eq!(decode("B", "th").unwrap(), vec![2]);
    }

    #[test]
    fn decodes_save_marker_after_number() {
        assert_eq!(decode("BZ", "th").unwrap(), vec![2, 0]);
    }

    #[test]
    fn decodes_continuation_digits() {
        // 'U' contributes 5*0+1=1 to the accumulator, then 'B' (digit 2)
        // completes the number as 20*1 + 2 = 22.
        assert_eq!(decode("UB", "th").unwrap(), vec![22]);
    }

    #[test]
    fn rejects_stray_z() {
        assert!(decode("Z", "th").is_err());
        assert!(decode("AZZ", "th").is_err());
    }

    #[test]
    fn rejects_unfinished_number() {
        assert!(decode("U", "th").is_err());
    }

    #[test]
    fn rejects_bogus_letter() {
        assert!(decode("1", "th").is_err());
    }

    #[test]
    fn overflow_is_reported_not_panicked() {
        let letters = "T".repeat(40);
        assert!(decode(&letters, "th").is_err());
    }
}
