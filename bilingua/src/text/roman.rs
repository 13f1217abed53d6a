//! Roman numerals as used in chapter and canto headings.

fn digit(c: char) -> Option<u32> {
    match c.to_ascii_uppercase() {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

/// Value of a Roman numeral with subtractive notation, case-insensitive.
///
/// Returns `None` for empty input or any non-numeral character. Sloppy
/// forms such as `IIII` are accepted.
pub fn roman_to_int(numeral: &str) -> Option<u32> {
    let values: Vec<u32> = numeral.trim().chars().map(digit).collect::<Option<_>>()?;
    if values.is_empty() {
        return None;
    }

    let mut total = 0;
    for (i, &value) in values.iter().enumerate() {
        match values.get(i + 1) {
            Some(&next) if next > value => total -= value as i64,
            _ => total += value as i64,
        }
    }

    u32::try_from(total).ok().filter(|&n| n > 0)
}
