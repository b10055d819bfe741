//! Number formatting for customer-facing amounts.

/// Formats an amount with a space as thousands separator.
///
/// Whole amounts print without decimals (`6000.0` → `"6 000"`); other
/// amounts keep two decimals with a comma (`1234.5` → `"1 234,50"`).
pub fn format_amount(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let negative = cents < 0;
    let cents = cents.unsigned_abs();
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    if negative {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if fraction != 0 {
        grouped.push_str(&format!(",{fraction:02}"));
    }
    grouped
}
