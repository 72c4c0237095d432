//! Format and check-digit rules for registry identifiers

/// LEI per ISO 17442: 18 alphanumerics, 2 check digits, MOD 97-10 == 1.
pub fn lei_is_valid(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 20 {
        return false;
    }
    let body_ok = bytes[..18]
        .iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    let check_ok = bytes[18..].iter().all(u8::is_ascii_digit);
    if !body_ok || !check_ok {
        return false;
    }

    // Letters expand to two digits (A=10 .. Z=35), so fold them in base 100.
    let remainder = bytes.iter().fold(0u32, |r, &b| {
        if b.is_ascii_digit() {
            (r * 10 + u32::from(b - b'0')) % 97
        } else {
            (r * 100 + u32::from(b - b'A') + 10) % 97
        }
    });
    remainder == 1
}

/// DUNS: exactly nine digits, no check digit.
pub fn duns_is_valid(value: &str) -> bool {
    value.len() == 9 && value.bytes().all(|b| b.is_ascii_digit())
}

/// GLN: thirteen digits with a GS1 mod-10 check digit.
pub fn gln_is_valid(value: &str) -> bool {
    value.len() == 13 && gs1_mod10_is_valid(value)
}

/// GTIN-8, -12, -13 or -14 with a GS1 mod-10 check digit.
pub fn gtin_is_valid(value: &str) -> bool {
    matches!(value.len(), 8 | 12 | 13 | 14) && gs1_mod10_is_valid(value)
}

/// GS1 mod-10: weights alternate 3, 1 leftwards from the digit before the
/// check digit.
fn gs1_mod10_is_valid(value: &str) -> bool {
    if value.len() < 2 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = value.bytes().map(|b| u32::from(b - b'0')).collect();
    let (check, body) = match digits.split_last() {
        Some((check, body)) => (*check, body),
        None => return false,
    };
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();
    (10 - sum % 10) % 10 == check
}
