use crate::core::outcome::PatchHunk;

/// The single changed region between two texts, found by trimming the common
/// leading and trailing lines. Line numbers are 1-based; `old_len` or
/// `new_len` of zero means a pure insertion or deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineHunk {
    pub start: usize,
    pub old_len: usize,
    pub new_len: usize,
}

impl LineHunk {
    /// Last old line touched. For pure insertions this is the line before
    /// the insertion point.
    pub fn old_end(&self) -> usize {
        (self.start + self.old_len).saturating_sub(1)
    }

    /// Lines of the old text touched by this hunk; an insertion touches the
    /// lines on both sides of it.
    pub fn touched(&self) -> (usize, usize) {
        if self.old_len == 0 {
            (self.start.saturating_sub(1).max(1), self.start)
        } else {
            (self.start, self.old_end())
        }
    }

    pub fn delta(&self) -> isize {
        self.new_len as isize - self.old_len as isize
    }
}

fn lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

pub fn line_hunk(old: &str, new: &str) -> Option<LineHunk> {
    if old == new {
        return None;
    }
    let a = lines(old);
    let b = lines(new);
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let max_suffix = a.len().min(b.len()) - prefix;
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(max_suffix)
        .take_while(|(x, y)| x == y)
        .count();
    Some(LineHunk {
        start: prefix + 1,
        old_len: a.len() - prefix - suffix,
        new_len: b.len() - prefix - suffix,
    })
}

/// Removed and added line texts for reporting.
pub fn patch_hunk(old: &str, new: &str) -> Option<PatchHunk> {
    let hunk = line_hunk(old, new)?;
    let strip = |l: &&str| l.trim_end_matches('\n').trim_end_matches('\r').to_string();
    let a = lines(old);
    let b = lines(new);
    let from = hunk.start - 1;
    Some(PatchHunk {
        start_line: hunk.start,
        removed: a[from..from + hunk.old_len].iter().map(strip).collect(),
        added: b[from..from + hunk.new_len].iter().map(strip).collect(),
    })
}

/// Maps line numbers of a file's original text onto its current text as
/// patches are committed.
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    hunks: Vec<LineHunk>,
}

impl LineMap {
    pub fn record(&mut self, hunk: LineHunk) {
        self.hunks.push(hunk);
    }

    /// Maps an inclusive range of original lines onto the current text.
    /// `None` only when a committed patch deleted every line of it; a range
    /// rewritten in place maps onto the replacement lines.
    pub fn map_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let mut range = (start, end);
        for hunk in &self.hunks {
            let (s, e) = range;
            if hunk.old_len > 0 && hunk.start <= s && e <= hunk.old_end() {
                if hunk.new_len == 0 {
                    return None;
                }
                range = (hunk.start, hunk.start + hunk.new_len - 1);
                continue;
            }
            let shift = |line: usize| -> usize {
                if line > hunk.old_end() && line >= hunk.start {
                    (line as isize + hunk.delta()) as usize
                } else {
                    line
                }
            };
            let new_s = if s >= hunk.start && s <= hunk.old_end() {
                hunk.start
            } else {
                shift(s)
            };
            let new_e = if e >= hunk.start && e <= hunk.old_end() {
                (hunk.start + hunk.new_len).saturating_sub(1).max(new_s)
            } else {
                shift(e)
            };
            range = (new_s, new_e.max(new_s));
        }
        Some(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_hunk_for_removal_and_insertion() {
        let old = "a\nb\nc\nd\n";
        let hunk = line_hunk(old, "a\nc\nd\n").unwrap();
        assert_eq!(hunk, LineHunk { start: 2, old_len: 1, new_len: 0 });
        assert_eq!(hunk.touched(), (2, 2));

        let hunk = line_hunk(old, "a\nb\nx\ny\nc\nd\n").unwrap();
        assert_eq!(hunk, LineHunk { start: 3, old_len: 0, new_len: 2 });
        assert_eq!(hunk.touched(), (2, 3));
        assert!(line_hunk(old, old).is_none());
    }

    #[test]
    fn test_patch_hunk_lines() {
        let hunk = patch_hunk("if (a == true) {\n}\n", "if (a) {\n}\n").unwrap();
        assert_eq!(hunk.start_line, 1);
        assert_eq!(hunk.removed, vec!["if (a == true) {"]);
        assert_eq!(hunk.added, vec!["if (a) {"]);
    }

    #[test]
    fn test_line_map_shifts_and_drops() {
        let mut map = LineMap::default();
        // line 3 removed
        map.record(LineHunk { start: 3, old_len: 1, new_len: 0 });
        assert_eq!(map.map_range(2, 2), Some((2, 2)));
        assert_eq!(map.map_range(3, 3), None);
        assert_eq!(map.map_range(7, 7), Some((6, 6)));
        // two lines inserted before current line 4
        map.record(LineHunk { start: 4, old_len: 0, new_len: 2 });
        assert_eq!(map.map_range(7, 7), Some((8, 8)));
        assert_eq!(map.map_range(4, 4), Some((3, 3)));
    }

    #[test]
    fn test_rewritten_line_still_maps() {
        let mut map = LineMap::default();
        map.record(LineHunk { start: 3, old_len: 1, new_len: 1 });
        assert_eq!(map.map_range(3, 3), Some((3, 3)));
        // two lines collapsed into one, then the line above removed
        map.record(LineHunk { start: 5, old_len: 2, new_len: 1 });
        assert_eq!(map.map_range(5, 6), Some((5, 5)));
        map.record(LineHunk { start: 2, old_len: 1, new_len: 0 });
        assert_eq!(map.map_range(5, 6), Some((4, 4)));
    }

    #[test]
    fn test_map_range_survives_inner_edit() {
        let mut map = LineMap::default();
        map.record(LineHunk { start: 5, old_len: 2, new_len: 0 });
        assert_eq!(map.map_range(3, 10), Some((3, 8)));
        assert_eq!(map.map_range(5, 6), None);
        assert_eq!(map.map_range(1, 2), Some((1, 2)));
    }
}
