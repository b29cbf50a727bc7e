//! Column reference conversion.
//!
//! Column letters are bijective base-26: there is no zero digit, so `Z` is
//! followed by `AA` rather than `BA`.

/// Convert column letters to a 0-based column index.
///
/// Returns `None` for an empty string, a non-letter character, or a column
/// too large to represent.
///
/// # Example
///
/// ```
/// use unxlsx::column_index;
///
/// assert_eq!(column_index("A"), Some(0));
/// assert_eq!(column_index("AA"), Some(26));
/// assert_eq!(column_index("ZZ"), Some(701));
/// ```
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }

    let mut number: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        number = number.checked_mul(26)?.checked_add(digit)?;
    }

    Some(number - 1)
}

/// Convert a 0-based column index to column letters.
///
/// # Example
///
/// ```
/// use unxlsx::column_letters;
///
/// assert_eq!(column_letters(0), "A");
/// assert_eq!(column_letters(702), "AAA");
/// ```
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index as u128 + 1;

    while remaining > 0 {
        let digit = ((remaining - 1) % 26) as u8;
        letters.push(b'A' + digit);
        remaining = (remaining - 1) / 26;
    }

    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Extract the column letters from a cell reference.
///
/// Every ASCII letter is kept and upper-cased; everything else is dropped,
/// so `"aa99"` becomes `"AA"` and `"1234"` becomes `""`.
pub fn column_from_reference(reference: &str) -> String {
    reference
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
