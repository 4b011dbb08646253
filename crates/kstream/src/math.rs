//! Integer division as binary format expressions define it.

/// Quotient rounded toward negative infinity.
///
/// Panics on a zero divisor, like `/`.
pub fn div_floor(a: i64, b: i64) -> i64 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Remainder whose sign follows the divisor, so that
/// `div_floor(a, b) * b + mod_floor(a, b) == a`.
pub fn mod_floor(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }
}
