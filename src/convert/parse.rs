//! Lenient numeric parsing for exposure settings.
//!
//! Settings come from metadata descriptions and from user input, so the parsers read the
//! leading numeric part of a string and ignore whatever follows (`"250 sec"`, `"2.8mm"`).

/// Parse the leading decimal number of a string.
///
/// Accepts an optional sign, digits with an optional fractional part, and an optional
/// exponent. Returns `None` when the string does not start with a number.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = decimal_prefix_len(s);
    if end == 0 {
        return None;
    }
    s[..end].parse::<f64>().ok()
}

/// Parse an f-number, accepting the `f/2.8` notation used by metadata descriptions.
pub fn parse_f_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let s = s
        .strip_prefix("f/")
        .or_else(|| s.strip_prefix("F/"))
        .unwrap_or(s);
    parse_decimal(s)
}

/// Parse the leading integer of a string; any fractional part is dropped.
pub fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<i64>().ok()
}

/// Length in bytes of the longest prefix of `s` that forms a decimal literal.
fn decimal_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i = 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }

    if digits == 0 {
        return 0;
    }

    // Exponent only counts when followed by at least one digit.
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    i
}
