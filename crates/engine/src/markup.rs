//! Fixed-width receipt layout.
//!
//! [`format`] turns a [`Receipt`] into the lines printed on a character
//! printer that is `max_symbols` columns wide. The layout is built from five
//! blocks, always in this order:
//!
//! ```text
//!          Olena Kovalenko            <- header, centered
//! ==================================
//! Bread                               <- products
//! 2 x 2.5                      = 5.0
//! ----------------------------------
//! Milk                                   one separator between items
//! 1 x 1.20                    = 1.20
//! ==================================
//! Total                         6.20  <- payment
//! Cash                         10.00
//! Change                        3.80
//! ==================================
//!   Thank you for your purchase!      <- footer
//!        2024-03-01 12:30:45
//! ```
//!
//! Lengths are counted in characters, not bytes. Long texts are cut into
//! fixed-width chunks without looking at word boundaries, except for the
//! merchant name which is packed word by word.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::{EngineError, LineItem, Payment, PaymentType, ResultEngine};

/// Width used when the merchant has not configured one.
pub const DEFAULT_MAX_SYMBOLS: i64 = 50;

/// Widest surface a receipt can be laid out on.
pub const MAX_CHECK_SYMBOLS: i64 = 500;

const THANK_YOU: &str = "Thank you for your purchase!";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name printed in the receipt header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Merchant {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Merchant {
    fn label(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

/// Everything needed to lay out one receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub merchant: Merchant,
    pub items: Vec<LineItem>,
    pub payment: Payment,
    pub total: Decimal,
    pub rest: Decimal,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

/// Lay out `receipt` on a surface `max_symbols` characters wide.
///
/// Fails with [`EngineError::InvalidConfig`] when `max_symbols` is outside
/// `1..=MAX_CHECK_SYMBOLS`. An
/// absent receipt renders to no lines at all.
pub fn format(receipt: Option<&Receipt>, max_symbols: i64) -> ResultEngine<Vec<String>> {
    let layout = Layout::new(max_symbols)?;
    let Some(receipt) = receipt else {
        return Ok(Vec::new());
    };

    let mut lines = layout.header(&receipt.merchant);
    lines.extend(layout.products(&receipt.items));
    lines.extend(layout.payment(receipt));
    lines.extend(layout.footer(receipt));
    Ok(lines)
}

/// Join lines for plain-text output (terminals, printers).
pub fn render_text(lines: &[String]) -> String {
    lines.join("\n")
}

/// Join lines for embedding in an HTML page, escaping every line.
pub fn render_html(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| escape_html(line))
        .collect::<Vec<_>>()
        .join("<br>")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            ' ' => escaped.push_str("&nbsp;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn money(amount: Decimal) -> String {
    amount.round_dp(2).to_string()
}

/// [`money`] padded to exactly two decimals, for the payment block.
fn money_fixed(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

/// Layout primitives bound to one surface width.
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    max_symbols: usize,
}

impl Layout {
    pub fn new(max_symbols: i64) -> ResultEngine<Self> {
        if max_symbols <= 0 {
            return Err(EngineError::InvalidConfig(format!(
                "max symbols must be > 0, got {max_symbols}"
            )));
        }
        if max_symbols > MAX_CHECK_SYMBOLS {
            return Err(EngineError::InvalidConfig(format!(
                "max symbols must be <= {MAX_CHECK_SYMBOLS}, got {max_symbols}"
            )));
        }
        let max_symbols = usize::try_from(max_symbols).map_err(|_| {
            EngineError::InvalidConfig(format!("max symbols too large: {max_symbols}"))
        })?;
        Ok(Self { max_symbols })
    }

    /// Left and right padding that fit `text` into the line.
    ///
    /// Centering splits the deficit with integer division, so an odd deficit
    /// leaves the line one column short. Over-length text gets no padding.
    pub fn spaces(&self, text: &str, align: Align) -> (String, String) {
        let empty = self.max_symbols.saturating_sub(width(text));
        match align {
            Align::Left => (String::new(), " ".repeat(empty)),
            Align::Right => (" ".repeat(empty), String::new()),
            Align::Center => (" ".repeat(empty / 2), " ".repeat(empty / 2)),
        }
    }

    /// `text`, trimmed, padded to the line width.
    pub fn line(&self, text: &str, align: Align) -> String {
        let text = text.trim();
        let (left, right) = self.spaces(text, align);
        format!("{left}{text}{right}")
    }

    /// Cut `text` into chunks of `max_symbols - indentation` characters.
    ///
    /// `indentation` reserves room for a suffix printed on the same line. When
    /// nothing is left the chunks degrade to single characters.
    pub fn split(&self, text: &str, indentation: usize) -> Vec<String> {
        let step = self.max_symbols.saturating_sub(indentation).max(1);
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(step)
            .map(|chunk| chunk.iter().collect())
            .collect()
    }

    fn rule(&self, symbol: char) -> String {
        symbol.to_string().repeat(self.max_symbols)
    }

    /// `label`, then `value` pushed flush against the right edge.
    fn justify(&self, label: &str, value: &str) -> String {
        let (_, pad) = self.spaces(&format!("{label}{value}"), Align::Left);
        format!("{label}{pad}{value}")
    }

    fn header(&self, merchant: &Merchant) -> Vec<String> {
        let label = merchant.label();
        let mut lines = Vec::new();

        if width(&label) <= self.max_symbols {
            lines.push(self.line(&label, Align::Center));
        } else {
            let mut packed = String::new();
            for word in label.split(' ').filter(|word| !word.is_empty()) {
                let candidate = if packed.is_empty() {
                    word.to_string()
                } else {
                    format!("{packed} {word}")
                };
                if width(&candidate) <= self.max_symbols {
                    packed = candidate;
                    continue;
                }

                if !packed.is_empty() {
                    lines.push(self.line(&packed, Align::Center));
                    packed.clear();
                }
                if width(word) <= self.max_symbols {
                    packed = word.to_string();
                } else {
                    lines.extend(
                        self.split(word, 0)
                            .iter()
                            .map(|chunk| self.line(chunk, Align::Center)),
                    );
                }
            }
            if !packed.is_empty() {
                lines.push(self.line(&packed, Align::Center));
            }
        }

        lines.push(self.rule('='));
        lines
    }

    fn products(&self, items: &[LineItem]) -> Vec<String> {
        let mut lines = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let suffix = format!("= {}", money(item.total));
            let suffix_width = width(&suffix);

            if width(&item.name) + suffix_width <= self.max_symbols {
                lines.push(self.line(&item.name, Align::Left));
            } else {
                lines.extend(self.split(&item.name, suffix_width));
            }

            let details = format!("{} x {}", item.quantity, item.price);
            let details_line = self.justify(&details, &suffix);
            if width(&details_line) <= self.max_symbols {
                lines.push(details_line);
            } else {
                let mut wrapped: Vec<String> = details
                    .split(' ')
                    .flat_map(|token| self.split(token, suffix_width))
                    .collect();
                // The total goes on the last chunk only.
                if let Some(last) = wrapped.last_mut() {
                    *last = self.justify(last, &suffix);
                }
                lines.extend(wrapped);
            }

            if index + 1 < items.len() {
                lines.push(self.rule('-'));
            }
        }

        lines.push(self.rule('='));
        lines
    }

    fn payment(&self, receipt: &Receipt) -> Vec<String> {
        let method = match receipt.payment.kind {
            PaymentType::Card => "Card",
            PaymentType::Cash => "Cash",
        };

        vec![
            self.justify("Total", &money_fixed(receipt.total)),
            self.justify(method, &money_fixed(receipt.payment.amount)),
            self.justify("Change", &money_fixed(receipt.rest)),
            self.rule('='),
        ]
    }

    fn footer(&self, receipt: &Receipt) -> Vec<String> {
        let mut lines = vec![
            self.line(THANK_YOU, Align::Center),
            self.line(
                &receipt.created_at.format(TIMESTAMP_FORMAT).to_string(),
                Align::Center,
            ),
        ];
        if let Some(comment) = receipt.comment.as_deref() {
            lines.extend(
                self.split(comment, 0)
                    .iter()
                    .map(|chunk| self.line(chunk, Align::Center)),
            );
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use std::str::FromStr;

    use super::*;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn centered(text: &str, pad: usize) -> String {
        format!("{0}{1}{0}", " ".repeat(pad), text)
    }

    fn created_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_micro_opt(12, 30, 45, 123_456)
            .unwrap()
    }

    fn receipt(items: Vec<LineItem>, paid: &str, comment: Option<&str>) -> Receipt {
        let total: Decimal = items.iter().map(|item| item.total).sum();
        let amount = dec(paid);
        Receipt {
            merchant: Merchant {
                first_name: Some("Olena".to_string()),
                last_name: Some("Kovalenko".to_string()),
            },
            items,
            payment: Payment {
                kind: PaymentType::Cash,
                amount,
            },
            total,
            rest: amount - total,
            comment: comment.map(ToString::to_string),
            created_at: created_at(),
        }
    }

    fn bread() -> LineItem {
        LineItem::new("Bread", dec("2.5"), dec("2")).unwrap()
    }

    #[test]
    fn rejects_width_outside_printer_range() {
        let receipt = receipt(vec![bread()], "5", None);
        for width in [0, -1, MAX_CHECK_SYMBOLS + 1, i64::from(i32::MAX)] {
            assert!(matches!(
                format(Some(&receipt), width),
                Err(EngineError::InvalidConfig(_))
            ));
        }
        assert!(matches!(format(None, 0), Err(EngineError::InvalidConfig(_))));

        let widest = format(Some(&receipt), MAX_CHECK_SYMBOLS).unwrap();
        assert!(widest.contains(&"=".repeat(500)));
    }

    #[test]
    fn absent_receipt_renders_nothing() {
        assert_eq!(format(None, 1).unwrap(), Vec::<String>::new());
        assert_eq!(format(None, 50).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn left_and_right_lines_fill_the_width() {
        let layout = Layout::new(20).unwrap();
        for text in ["", "a", "Bread", "exactly twenty chars"] {
            assert_eq!(layout.line(text, Align::Left).chars().count(), 20);
            assert_eq!(layout.line(text, Align::Right).chars().count(), 20);
        }
        assert_eq!(layout.line("Bread", Align::Right), format!("{:>20}", "Bread"));
        assert_eq!(layout.line("  Bread ", Align::Left), format!("{:<20}", "Bread"));
    }

    #[test]
    fn center_drops_the_odd_column() {
        let layout = Layout::new(10).unwrap();
        assert_eq!(layout.line("ab", Align::Center), "    ab    ");
        assert_eq!(layout.line("abc", Align::Center), "   abc   ");
        assert_eq!(
            layout.spaces("abc", Align::Center),
            ("   ".to_string(), "   ".to_string())
        );
    }

    #[test]
    fn line_counts_characters_not_bytes() {
        let layout = Layout::new(8).unwrap();
        assert_eq!(layout.line("Хліб", Align::Left).chars().count(), 8);
    }

    #[test]
    fn split_chunks_reassemble_the_text() {
        let layout = Layout::new(10).unwrap();
        let text = "a rather long product name with spaces";
        for indentation in [0, 3, 7] {
            let chunks = layout.split(text, indentation);
            assert!(chunks.len() > 1);
            assert!(chunks.iter().all(|c| c.chars().count() <= 10 - indentation));
            assert_eq!(chunks.concat(), text);
        }
        assert!(layout.split("", 0).is_empty());
    }

    #[test]
    fn split_without_room_degrades_to_single_characters() {
        let layout = Layout::new(4).unwrap();
        assert_eq!(layout.split("abc", 6), vec!["a", "b", "c"]);
    }

    #[test]
    fn details_line_right_justifies_the_total() {
        let lines = format(Some(&receipt(vec![bread()], "5", None)), 20).unwrap();
        assert_eq!(lines[2], format!("{:<20}", "Bread"));
        assert_eq!(lines[3], "2 x 2.5        = 5.0");
        assert_eq!(lines[3].chars().count(), 20);
    }

    #[test]
    fn full_layout() {
        let milk = LineItem::new("Milk", dec("1.20"), dec("1")).unwrap();
        let lines = format(
            Some(&receipt(vec![bread(), milk], "10.00", Some("Come back soon"))),
            34,
        )
        .unwrap();

        let expected = vec![
            centered("Olena Kovalenko", 9),
            "=".repeat(34),
            format!("{:<34}", "Bread"),
            format!("{:<29}{}", "2 x 2.5", "= 5.0"),
            "-".repeat(34),
            format!("{:<34}", "Milk"),
            format!("{:<28}{}", "1 x 1.20", "= 1.20"),
            "=".repeat(34),
            format!("{:<30}{}", "Total", "6.20"),
            format!("{:<29}{}", "Cash", "10.00"),
            format!("{:<30}{}", "Change", "3.80"),
            "=".repeat(34),
            centered("Thank you for your purchase!", 3),
            centered("2024-03-01 12:30:45", 7),
            centered("Come back soon", 10),
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn long_merchant_name_is_packed_by_words() {
        let layout = Layout::new(24).unwrap();
        let header = layout.header(&Merchant {
            first_name: Some("Anna Maria".to_string()),
            last_name: Some("Sokolovska-Vyshnevetska".to_string()),
        });

        assert_eq!(
            header,
            vec![
                centered("Anna Maria", 7),
                "Sokolovska-Vyshnevetska".to_string(),
                "=".repeat(24),
            ]
        );
        assert_eq!(header[0].chars().count(), 24);
        let words: Vec<&str> = header[..2]
            .iter()
            .flat_map(|line| line.split_whitespace())
            .collect();
        assert_eq!(words.join(" "), "Anna Maria Sokolovska-Vyshnevetska");
    }

    #[test]
    fn overlong_merchant_word_is_hard_chunked() {
        let layout = Layout::new(6).unwrap();
        let header = layout.header(&Merchant {
            first_name: Some("Al".to_string()),
            last_name: Some("Abcdefghij".to_string()),
        });
        assert_eq!(header, vec!["  Al  ", "Abcdef", " ghij ", "======"]);
    }

    #[test]
    fn missing_merchant_names_are_blank() {
        let layout = Layout::new(6).unwrap();
        let header = layout.header(&Merchant {
            first_name: None,
            last_name: Some("Bo".to_string()),
        });
        assert_eq!(header, vec!["  Bo  ", "======"]);
    }

    #[test]
    fn long_product_name_is_chunked_around_the_total() {
        let item = LineItem::new("Organic whole grain bread", dec("3"), dec("1")).unwrap();
        let lines = Layout::new(16).unwrap().products(&[item]);

        // "= 3" reserves 3 columns, so the name is cut every 13 characters.
        assert_eq!(
            lines,
            vec![
                "Organic whole".to_string(),
                " grain bread".to_string(),
                format!("{:<13}{}", "1 x 3", "= 3"),
                "=".repeat(16),
            ]
        );
    }

    #[test]
    fn overlong_details_attach_total_to_last_chunk_only() {
        let item = LineItem::new("Nails", dec("0.0125"), dec("1000")).unwrap();
        let lines = Layout::new(12).unwrap().products(&[item]);

        // "1000 x 0.0125" and "= 12.50" cannot share a 12 column line.
        assert_eq!(
            lines,
            vec![
                "Nails       ".to_string(),
                "1000".to_string(),
                "x".to_string(),
                "0.012".to_string(),
                format!("{:<5}{}", "5", "= 12.50"),
                "=".repeat(12),
            ]
        );
    }

    #[test]
    fn separators_only_between_items() {
        let items = vec![
            bread(),
            LineItem::new("Milk", dec("1"), dec("1")).unwrap(),
            LineItem::new("Eggs", dec("3"), dec("1")).unwrap(),
        ];
        let lines = format(Some(&receipt(items, "20", None)), 30).unwrap();
        let dashes = "-".repeat(30);
        assert_eq!(lines.iter().filter(|l| **l == dashes).count(), 2);

        let last_dash = lines.iter().rposition(|l| *l == dashes).unwrap();
        assert_eq!(lines[last_dash + 1], format!("{:<30}", "Eggs"));
        assert_eq!(lines[last_dash + 3], "=".repeat(30));
    }

    #[test]
    fn single_item_has_no_separator() {
        let lines = format(Some(&receipt(vec![bread()], "5", None)), 20).unwrap();
        assert!(!lines.iter().any(|l| l.starts_with('-')));
    }

    #[test]
    fn payment_block_is_always_four_lines_with_two_decimals() {
        let layout = Layout::new(20).unwrap();
        for comment in [None, Some("hi")] {
            let receipt = receipt(vec![bread()], "4", comment);
            assert_eq!(
                layout.payment(&receipt),
                vec![
                    format!("{:<16}{}", "Total", "5.00"),
                    format!("{:<16}{}", "Cash", "4.00"),
                    format!("{:<15}{}", "Change", "-1.00"),
                    "=".repeat(20),
                ]
            );
        }
    }

    #[test]
    fn card_payment_label() {
        let mut receipt = receipt(vec![bread()], "5", None);
        receipt.payment.kind = PaymentType::Card;
        let lines = Layout::new(20).unwrap().payment(&receipt);
        assert_eq!(lines[1], format!("{:<16}{}", "Card", "5.00"));
    }

    #[test]
    fn money_rounds_half_to_even() {
        assert_eq!(money(dec("2.345")), "2.34");
        assert_eq!(money(dec("2.355")), "2.36");
        assert_eq!(money(dec("12.5000")), "12.50");
        assert_eq!(money(dec("7")), "7");
        assert_eq!(money_fixed(dec("7")), "7.00");
        assert_eq!(money_fixed(dec("5.0")), "5.00");
        assert_eq!(money_fixed(dec("2.345")), "2.34");
        assert_eq!(money_fixed(dec("-1")), "-1.00");
    }

    #[test]
    fn footer_wraps_and_centers_the_comment() {
        let receipt = receipt(vec![bread()], "5", Some("abcdefghijkl"));
        let footer = Layout::new(10).unwrap().footer(&receipt);
        assert_eq!(
            footer,
            vec![
                "Thank you for your purchase!",
                "2024-03-01 12:30:45",
                "abcdefghij",
                "    kl    ",
            ]
        );
    }

    #[test]
    fn receipt_without_items_keeps_the_frame() {
        let lines = format(Some(&receipt(Vec::new(), "0", None)), 20).unwrap();
        assert_eq!(lines[1], "=".repeat(20));
        assert_eq!(lines[2], "=".repeat(20));
        assert_eq!(lines[3], format!("{:<16}{}", "Total", "0.00"));
    }

    #[test]
    fn html_rendering_escapes_lines() {
        let lines = vec!["<b> & co".to_string(), "x".to_string()];
        assert_eq!(render_html(&lines), "&lt;b&gt;&nbsp;&amp;&nbsp;co<br>x");
        assert_eq!(render_text(&lines), "<b> & co\nx");
    }
}
