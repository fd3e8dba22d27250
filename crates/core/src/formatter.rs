//! Plain-text report rendering for ranked price-change groups.

#![allow(clippy::format_push_string)]

use crate::models::LocationGroup;
use rust_decimal::Decimal;

const GROUP_SEPARATOR: &str = "------------------------------";

/// Renders location groups into the channel report.
///
/// The output is a pure function of the input groups: no clocks, no
/// ambient state. Rendering the same groups twice yields byte-identical
/// strings, which keeps persisted reports diffable across runs.
pub struct ReportFormatter {
    max_area: Decimal,
}

impl ReportFormatter {
    #[must_use]
    pub fn new(max_area: Decimal) -> Self {
        Self { max_area }
    }

    #[must_use]
    pub fn format(&self, groups: &[LocationGroup]) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Top-3 sharpest price changes for apartments up to {} m\u{b2} by location:\n\n",
            self.max_area.normalize()
        ));

        for group in groups {
            if group.records.is_empty() {
                continue;
            }

            output.push_str(&format!("Location: {}\n", group.location));
            output.push_str(GROUP_SEPARATOR);
            output.push('\n');

            for (i, record) in group.records.iter().enumerate() {
                let glyph = if record.pct_change > Decimal::ZERO {
                    "\u{1F4C8}"
                } else {
                    "\u{1F4C9}"
                };
                let sign = if record.pct_change > Decimal::ZERO {
                    "+"
                } else {
                    ""
                };

                output.push_str(&format!("{}. {}\n", i + 1, record.title));
                output.push_str(&format!("   ID: {}\n", record.id));
                output.push_str(&format!(
                    "   Current price: {} AED\n",
                    format_amount(record.current_price)
                ));
                output.push_str(&format!(
                    "   Previous price: {} AED\n",
                    format_amount(record.prev_price)
                ));
                output.push_str(&format!(
                    "   Change: {glyph} {sign}{:.2}%\n",
                    record.pct_change
                ));
                if let (Some(current), Some(prev)) =
                    (record.current_updated_at, record.prev_updated_at)
                {
                    output.push_str(&format!(
                        "   Last updated: {}\n",
                        current.format("%d.%m.%Y")
                    ));
                    output.push_str(&format!(
                        "   Previously updated: {}\n",
                        prev.format("%d.%m.%Y")
                    ));
                }
                output.push_str(&format!("   Area: {:.2} m\u{b2}\n", record.area));
                output.push_str(&format!(
                    "   Bedrooms: {}\n",
                    record.rooms.unwrap_or_default()
                ));
                output.push_str(&format!("   Link: {}\n", record.property_url));
                output.push('\n');
            }

            output.push('\n');
        }

        output
    }
}

/// Formats a monetary amount with thousands separators and two decimals.
fn format_amount(value: Decimal) -> String {
    let rendered = format!("{:.2}", value);
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{frac_part}")
}
