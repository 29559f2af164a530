//! Formatted, sorted, colorized item table for listings.

use std::collections::HashMap;
use std::io::Write;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::cmd::style;
use crate::tracker::parsing::{parse_color_rules, ColorRule, Matcher};
use crate::tracker::{key_values, Item, Result, TrackerError};

const GAP: &str = "  ";
const MIN_COLUMN_WIDTH: usize = 3;

/// Table of items. The column set comes from a comma-separated format
/// specification, row order from a comma-separated multi-key sort
/// specification (leftmost key has priority), and row decoration from
/// colorization rules. Rendering fits the table to `max_width` by shaving
/// the widest column.
pub struct ItemTable {
    cols: Vec<Column>,
    sort_keys: Vec<String>,
    color_rules: Vec<ColorRule>,
    max_width: usize,
    rows: Vec<Row>,
}

struct Column {
    key: String,
    heading: String,
}

struct Row {
    cells: Vec<String>,
    sort_values: Vec<String>,
    cond_values: HashMap<String, Vec<String>>,
}

impl ItemTable {
    pub fn new(fmt: &str, sort: &str, color_spec: &str, max_width: usize) -> Result<Self> {
        let cols = split_keys(fmt)
            .into_iter()
            .map(|key| {
                let heading = key.to_uppercase().trim_start_matches('_').to_string();
                Column { key, heading }
            })
            .collect();

        let color_rules = parse_color_rules(color_spec)
            .ok_or_else(|| TrackerError::WrongExpression(color_spec.to_string()))?;

        Ok(Self {
            cols,
            sort_keys: split_keys(sort),
            color_rules,
            max_width,
            rows: Vec::new(),
        })
    }

    /// Adds an item to the table, capturing every value the format, sort
    /// and colorization specifications refer to.
    pub fn append(&mut self, item: &mut Item) -> Result<()> {
        let mut cells = Vec::with_capacity(self.cols.len());
        for col in &self.cols {
            cells.push(item.value(&col.key)?);
        }

        let mut sort_values = Vec::with_capacity(self.sort_keys.len());
        for key in &self.sort_keys {
            sort_values.push(item.value(key)?);
        }

        let mut cond_values = HashMap::new();
        for rule in &self.color_rules {
            for matcher in &rule.matchers {
                if let Matcher::Cond(cond) = matcher {
                    if !cond_values.contains_key(&cond.key) {
                        cond_values.insert(cond.key.clone(), key_values(item, &cond.key)?);
                    }
                }
            }
        }

        self.rows.push(Row {
            cells,
            sort_values,
            cond_values,
        });
        Ok(())
    }

    /// Sorts and prints the table. Nothing is printed when there are no
    /// columns or the width cannot accommodate them.
    pub fn print(&mut self, out: &mut dyn Write, decorate: bool) -> Result<()> {
        if self.cols.is_empty() {
            return Ok(());
        }

        // Stable sorting by each key right to left gives the leftmost key
        // the highest priority.
        for idx in (0..self.sort_keys.len()).rev() {
            self.rows
                .sort_by(|a, b| a.sort_values[idx].cmp(&b.sort_values[idx]));
        }

        let widths = match self.fit_widths() {
            Some(widths) => widths,
            None => return Ok(()),
        };

        let headings: Vec<&str> = self.cols.iter().map(|col| col.heading.as_str()).collect();
        let heading_style = style::combine(&self.heading_decors());
        writeln!(
            out,
            "{}",
            style::paint(&heading_style, &compose_line(&headings, &widths), decorate)
        )?;

        for row in &self.rows {
            let cells: Vec<&str> = row.cells.iter().map(String::as_str).collect();
            let row_style = style::combine(&self.row_decors(row));
            writeln!(
                out,
                "{}",
                style::paint(&row_style, &compose_line(&cells, &widths), decorate)
            )?;
        }

        Ok(())
    }

    /// Column widths that fit `max_width`, shrinking the widest column
    /// (leftmost on ties) one cell at a time, to no less than three cells.
    fn fit_widths(&self) -> Option<Vec<usize>> {
        let mut widths: Vec<usize> = self
            .cols
            .iter()
            .enumerate()
            .map(|(i, col)| {
                self.rows
                    .iter()
                    .map(|row| UnicodeWidthStr::width(row.cells[i].as_str()))
                    .chain(std::iter::once(UnicodeWidthStr::width(
                        col.heading.as_str(),
                    )))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut total: usize = widths.iter().sum::<usize>() + GAP.len() * (widths.len() - 1);
        while total > self.max_width {
            let (widest, width) = widths
                .iter()
                .copied()
                .enumerate()
                .rev()
                .max_by_key(|&(_, w)| w)
                .unwrap_or((0, 0));
            if width <= MIN_COLUMN_WIDTH {
                break;
            }

            widths[widest] -= 1;
            total -= 1;
        }

        if total > self.max_width {
            return None;
        }
        Some(widths)
    }

    fn heading_decors(&self) -> Vec<crate::tracker::parsing::Decor> {
        let mut decors = Vec::new();
        for rule in &self.color_rules {
            if rule.matchers.contains(&Matcher::Heading) {
                decors.extend_from_slice(&rule.decors);
            }
        }
        decors
    }

    fn row_decors(&self, row: &Row) -> Vec<crate::tracker::parsing::Decor> {
        let mut decors = Vec::new();
        for rule in &self.color_rules {
            let matched = rule.matchers.iter().any(|matcher| match matcher {
                Matcher::Heading => false,
                Matcher::Cond(cond) => row
                    .cond_values
                    .get(&cond.key)
                    .map(|values| values.iter().any(|v| cond.op.test(v, &cond.value)))
                    .unwrap_or(false),
            });

            if matched {
                decors.extend_from_slice(&rule.decors);
            }
        }
        decors
    }
}

fn split_keys(spec: &str) -> Vec<String> {
    spec.split(',')
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

fn compose_line(cells: &[&str], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str(GAP);
        }
        line.push_str(&clip(cell, width));
    }
    line
}

/// Pads or truncates a cell to exactly `width` display cells. Truncated
/// content keeps an ellipsis when there is room for one.
fn clip(s: &str, width: usize) -> String {
    let current = UnicodeWidthStr::width(s);
    if current <= width {
        let mut padded = s.to_string();
        padded.push_str(&" ".repeat(width - current));
        return padded;
    }

    if width < 4 {
        return ".".repeat(width);
    }

    let mut clipped = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width - 3 {
            break;
        }
        clipped.push(c);
        used += w;
    }
    clipped.push_str("...");
    clipped.push_str(&" ".repeat(width - used - 3));
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, fields: &[(&str, &str)]) -> Item {
        let mut item = Item::new_fresh(id.to_string());
        for (i, (key, value)) in fields.iter().enumerate() {
            item.set_value_at(key, value, i as i64 + 1).unwrap();
        }
        item
    }

    fn printed(table: &mut ItemTable) -> String {
        let mut out = Vec::new();
        table.print(&mut out, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn broken_color_specification_is_an_error() {
        assert!(ItemTable::new("", "", "this is not valid", 80).is_err());
    }

    #[test]
    fn no_columns_produce_no_output() {
        let mut table = ItemTable::new("", "", "", 80).unwrap();
        table.append(&mut item("id", &[("title", "title")])).unwrap();
        assert_eq!(printed(&mut table), "");
    }

    #[test]
    fn basic_listing_pads_cells() {
        let mut table = ItemTable::new("_id,title", "_id", "", 80).unwrap();
        table.append(&mut item("abc", &[("title", "hello")])).unwrap();

        assert_eq!(printed(&mut table), "ID   TITLE\nabc  hello\n");
    }

    #[test]
    fn longest_column_is_shortened_first() {
        let mut table = ItemTable::new("_id,title", "", "", 8).unwrap();
        table.append(&mut item("id", &[("title", "title")])).unwrap();

        assert_eq!(printed(&mut table), "ID  T...\nid  t...\n");
    }

    #[test]
    fn zero_width_produces_no_output() {
        let mut table = ItemTable::new("_id,title", "", "", 0).unwrap();
        table.append(&mut item("id", &[("title", "title")])).unwrap();
        assert_eq!(printed(&mut table), "");
    }

    #[test]
    fn rows_follow_the_sort_specification() {
        let mut table = ItemTable::new("_id", "_id", "", 80).unwrap();
        table.append(&mut item("ccc", &[])).unwrap();
        table.append(&mut item("aaa", &[])).unwrap();
        table.append(&mut item("bbb", &[])).unwrap();

        assert_eq!(printed(&mut table), "ID \naaa\nbbb\nccc\n");
    }

    #[test]
    fn leftmost_sort_key_has_priority() {
        let mut table = ItemTable::new("_id", "status,_id", "", 80).unwrap();
        table
            .append(&mut item("bbb", &[("status", "wip")]))
            .unwrap();
        table
            .append(&mut item("ccc", &[("status", "done")]))
            .unwrap();
        table
            .append(&mut item("aaa", &[("status", "wip")]))
            .unwrap();

        assert_eq!(printed(&mut table), "ID \nccc\naaa\nbbb\n");
    }

    #[test]
    fn colorization_applies_to_matching_rows() {
        let mut table =
            ItemTable::new("_id", "", "inv !heading; fg-red status==done", 80).unwrap();
        table
            .append(&mut item("abc", &[("status", "done")]))
            .unwrap();

        let mut out = Vec::new();
        table.print(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("\u{1b}[7m"));
        assert!(lines[1].contains("\u{1b}[31m"));
    }

    #[test]
    fn disabled_decorations_emit_no_escapes() {
        let mut table =
            ItemTable::new("_id", "", "inv !heading; fg-red status==done", 80).unwrap();
        table
            .append(&mut item("abc", &[("status", "done")]))
            .unwrap();

        assert!(!printed(&mut table).contains('\u{1b}'));
    }

    #[test]
    fn invalid_format_key_fails_on_append() {
        let mut table = ItemTable::new("_id,bad key", "", "", 80).unwrap();
        assert!(table.append(&mut item("abc", &[])).is_err());
    }
}
