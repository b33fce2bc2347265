//! Carrier typographic rules for the destination and sender blocks.
//!
//! Both blocks have four lines: name, street, district, locality. Width
//! control is a character-count heuristic (`floor(width / (font * k))`), not a
//! glyph measurement pass; renderers that know real metrics should still keep
//! the cut-and-ellipsize policy.

use std::borrow::Cow;

use crate::model::{Address, Sender};
use crate::postal_code::PostalCode;

/// Printed in place of a missing building number.
pub const NO_NUMBER: &str = "s/n";

const NO_NUMBER_MARKERS: [&str; 2] = ["SN", "S.N."];
const ELLIPSIS: &str = "...";

/// Maps empty input and the `SN` / `S.N.` markers to `s/n`.
pub fn normalize_number(number: &str) -> &str {
    let trimmed = number.trim();
    if trimmed.is_empty()
        || NO_NUMBER_MARKERS
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        NO_NUMBER
    } else {
        trimmed
    }
}

/// `"{street}, {number}"` with an optional `", {complement}"` suffix.
pub fn street_line(street: &str, number: &str, complement: Option<&str>) -> String {
    let mut line = format!("{}, {}", street, normalize_number(number));
    if let Some(complement) = complement {
        line.push_str(", ");
        line.push_str(complement);
    }
    line
}

fn locality_line(postal_code: &PostalCode, city: &str, state: &str) -> String {
    format!(
        "{} {}/{}",
        postal_code.formatted(),
        city,
        state.to_uppercase()
    )
}

/// Destination block: recipient (or `fallback_name`) upper-cased, street,
/// district, then `DDDDD-DDD City/UF`.
pub fn destination_lines(address: &Address, fallback_name: &str) -> Vec<String> {
    let name = address.recipient.as_deref().unwrap_or(fallback_name);
    vec![
        name.to_uppercase(),
        street_line(
            &address.street,
            &address.number,
            address.complement.as_deref(),
        ),
        address.district.clone(),
        locality_line(&address.postal_code, &address.city, &address.state),
    ]
}

/// Sender block. The first line carries the `Rem: ` marker and keeps the
/// name's original case.
pub fn sender_lines(sender: &Sender) -> Vec<String> {
    vec![
        format!("Rem: {}", sender.name),
        street_line(&sender.street, &sender.number, sender.complement.as_deref()),
        sender.district.clone(),
        locality_line(&sender.postal_code, &sender.city, &sender.state),
    ]
}

/// Character budget for a line of `font_size` across `available_width`
/// (both in points) with the empirical width factor `k`.
pub fn max_chars(available_width: f32, font_size: f32, k: f32) -> usize {
    let per_char = font_size * k;
    if per_char <= 0.0 || available_width <= 0.0 {
        return 0;
    }
    (available_width / per_char).floor() as usize
}

/// `floor((W - 2m) / (f * k))` for a canvas of width `W` with margin `m`.
pub fn max_chars_for_canvas(canvas_width: f32, margin: f32, font_size: f32, k: f32) -> usize {
    max_chars(canvas_width - 2.0 * margin, font_size, k)
}

/// Cuts a line longer than `max_chars` to `max_chars - 3` characters plus
/// `"..."`. Lines within budget are returned untouched.
pub fn truncate_line(line: &str, max_chars: usize) -> Cow<'_, str> {
    if line.chars().count() <= max_chars {
        return Cow::Borrowed(line);
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut cut: String = line.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    Cow::Owned(cut)
}
