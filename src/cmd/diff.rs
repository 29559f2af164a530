//! Line-level diff of two value snapshots.
//!
//! Uses the edit-distance formulation without substitutions, which yields a
//! longest-common-subsequence diff on backtracking. Runs of more than three
//! identical lines keep their first and last line with a fold marker in
//! between.

use std::cmp;

use crate::cmd::style;

/// Computes the prefixed line diff between the previous and the current
/// snapshot: `- ` for deletions, `+ ` for insertions, `  ` for matches.
pub fn diff_lines(prev: &[String], curr: &[String]) -> Vec<String> {
    let np = prev.len();
    let nc = curr.len();

    let mut d = vec![vec![0usize; nc + 1]; np + 1];
    for i in 0..=np {
        for j in 0..=nc {
            if i == 0 {
                d[i][j] = j;
            } else if j == 0 {
                d[i][j] = i;
            } else {
                d[i][j] = cmp::min(d[i - 1][j] + 1, d[i][j - 1] + 1);
                if prev[i - 1] == curr[j - 1] {
                    d[i][j] = cmp::min(d[i - 1][j - 1], d[i][j]);
                }
            }
        }
    }

    let mut result: Vec<String> = Vec::new();
    let mut identical = 0;

    let mut i = np;
    let mut j = nc;
    while i != 0 || j != 0 {
        if i == 0 {
            fold_identical(&mut result, &mut identical);
            j -= 1;
            result.insert(0, format!("+ {}", curr[j]));
        } else if j == 0 {
            fold_identical(&mut result, &mut identical);
            i -= 1;
            result.insert(0, format!("- {}", prev[i]));
        } else if d[i][j] == d[i][j - 1] + 1 {
            fold_identical(&mut result, &mut identical);
            j -= 1;
            result.insert(0, format!("+ {}", curr[j]));
        } else if d[i][j] == d[i - 1][j] + 1 {
            fold_identical(&mut result, &mut identical);
            i -= 1;
            result.insert(0, format!("- {}", prev[i]));
        } else {
            i -= 1;
            j -= 1;
            result.insert(0, format!("  {}", prev[i]));
            identical += 1;
        }
    }
    fold_identical(&mut result, &mut identical);

    result
}

/// Replaces the middle of a long identical run, which sits at the front of
/// `result`, with a fold marker.
fn fold_identical(result: &mut Vec<String>, identical: &mut usize) {
    if *identical > 3 {
        result.drain(1..*identical - 1);
        result.insert(1, format!("<{} unchanged lines folded>", *identical - 2));
    }
    *identical = 0;
}

/// Renders prefixed diff lines, one per line, colorized by kind.
pub fn render(lines: &[String], decorate: bool) -> String {
    let mut rendered = String::new();
    for line in lines {
        let painted = match line.as_bytes().first() {
            Some(b'+') => style::paint(&style::GREEN, line, decorate),
            Some(b'-') => style::paint(&style::RED, line, decorate),
            Some(b'<') => style::paint(&style::DIM, line, decorate),
            _ => line.clone(),
        };
        rendered.push_str(&painted);
        rendered.push('\n');
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_snapshots_diff_to_context_only() {
        let text = lines(&["a", "b"]);
        assert_eq!(diff_lines(&text, &text), lines(&["  a", "  b"]));
    }

    #[test]
    fn insertion_and_deletion_are_marked() {
        assert_eq!(
            diff_lines(&lines(&["a", "b"]), &lines(&["a", "c"])),
            lines(&["  a", "- b", "+ c"])
        );
    }

    #[test]
    fn addition_to_empty_snapshot() {
        assert_eq!(
            diff_lines(&[], &lines(&["x", "y"])),
            lines(&["+ x", "+ y"])
        );
    }

    #[test]
    fn long_identical_runs_are_folded() {
        let prev = lines(&["a", "b", "c", "d", "e"]);
        let curr = lines(&["a", "b", "c", "d", "f"]);

        assert_eq!(
            diff_lines(&prev, &curr),
            lines(&["  a", "<2 unchanged lines folded>", "  d", "- e", "+ f"])
        );
    }

    #[test]
    fn three_line_runs_are_kept_whole() {
        let prev = lines(&["a", "b", "c", "x"]);
        let curr = lines(&["a", "b", "c", "y"]);

        assert_eq!(
            diff_lines(&prev, &curr),
            lines(&["  a", "  b", "  c", "- x", "+ y"])
        );
    }

    #[test]
    fn rendering_keeps_line_order() {
        let rendered = render(&lines(&["  a", "- b", "+ c"]), false);
        assert_eq!(rendered, "  a\n- b\n+ c\n");
    }
}
