//! Display helpers for card numbers and money amounts.

/// Insert a space after every fourth character: `"41111111"` -> `"4111 1111"`.
pub fn card_number_with_space(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 4);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Mask a PAN for display: first six and last four characters are kept,
/// everything in between becomes a bullet.
pub fn pci_obscure(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let tail = len.saturating_sub(4);
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| if i < 6 || i >= tail { c } else { '\u{2022}' })
        .collect()
}

/// Render an amount in cents as `D.CC`.
pub fn to_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

pub fn is_all_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

pub fn is_valid_cvv(s: &str) -> bool {
    s.len() == 3 && is_all_digits(s)
}
