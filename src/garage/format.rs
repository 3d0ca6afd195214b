//! French rendering helpers shared by status details and the printed record.

use chrono::NaiveDate;

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Thousands grouped with a space, sign preserved: 14500 -> "14 500".
pub(crate) fn format_km(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Euro amount, comma decimal: 1234.5 -> "1 234,50 €".
pub(crate) fn format_cost(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as i64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{},{:02} €", format_km(cents / 100), cents % 100)
}
