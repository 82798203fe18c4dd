//! # OverlapResult
//!
//! The rows of an input-assembly scaffold that fall within a bait interval,
//! with the arithmetic needed to decide whether the span beyond the bait is
//! texel rounding noise (discard a terminal row) or a real cut (replace the
//! terminal row with a shorter fragment).
//!
//! `start` and `end` are coordinates within the input scaffold the rows came
//! from, so `start_overhang` and `end_overhang` measure how far the result
//! extends past (positive) or falls short of (negative) the bait.
use std::fmt;

use anyhow::{bail, Result};

use crate::fragment::Fragment;
use crate::scaffold::{Row, Scaffold};
use crate::utils::{range_overlap, underscored};

#[derive(Debug, Clone)]
pub struct OverlapResult {
    pub scaffold: Scaffold,
    pub bait: Fragment,
    pub start: i64,
    pub end: i64,
}

impl OverlapResult {
    pub fn new(bait: Fragment, start: i64, end: i64, rows: Vec<Row>) -> OverlapResult {
        let name = format!("matches to {} {} to {}", bait.name(), bait.start(), bait.end());
        OverlapResult {
            scaffold: Scaffold::with_rows(name, rows),
            bait,
            start,
            end,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.scaffold.rows
    }

    pub fn length(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn start_overhang(&self) -> i64 {
        self.bait.start() - self.start
    }

    pub fn end_overhang(&self) -> i64 {
        self.end - self.bait.end()
    }

    pub fn length_error(&self) -> i64 {
        self.length() - self.bait.length()
    }

    pub fn length_error_in_texels(&self, bp_per_texel: f64) -> f64 {
        self.length_error().unsigned_abs() as f64 / bp_per_texel
    }

    /// Overlap between the bait interval and the first row, both in the
    /// input scaffold's coordinates.
    pub fn start_row_bait_overlap(&self) -> i64 {
        match self.scaffold.rows.first() {
            Some(row) => range_overlap(
                self.bait.start(),
                self.bait.end(),
                self.start,
                self.start + row.length() - 1,
            )
            .unwrap_or(0),
            None => 0,
        }
    }

    /// Overlap between the bait interval and the last row.
    pub fn end_row_bait_overlap(&self) -> i64 {
        match self.scaffold.rows.last() {
            Some(row) => range_overlap(
                self.bait.start(),
                self.bait.end(),
                self.end - row.length() + 1,
                self.end,
            )
            .unwrap_or(0),
            None => 0,
        }
    }

    /// Remove the first row and any gaps this exposes, moving `start`
    /// rightwards by the removed length.
    pub fn discard_start(&mut self) {
        if !self.scaffold.rows.is_empty() {
            let row = self.scaffold.rows.remove(0);
            self.start += row.length();
        }
        self.remove_leading_and_trailing_gaps();
    }

    /// Remove the last row and any gaps this exposes, moving `end`
    /// leftwards by the removed length.
    pub fn discard_end(&mut self) {
        if let Some(row) = self.scaffold.rows.pop() {
            self.end -= row.length();
        }
        self.remove_leading_and_trailing_gaps();
    }

    pub fn remove_leading_and_trailing_gaps(&mut self) {
        while self.scaffold.rows.first().is_some_and(Row::is_gap) {
            let discard = self.scaffold.rows.remove(0);
            self.start += discard.length();
        }
        while self.scaffold.rows.last().is_some_and(Row::is_gap) {
            let discard = self.scaffold.rows.pop().unwrap();
            self.end -= discard.length();
        }
    }

    /// What `start_overhang` would become were the first row (and the gaps
    /// behind it) discarded. Negative values mean the result would fall
    /// short of the bait.
    pub fn overhang_if_start_removed(&self) -> i64 {
        let mut new_start = self.start;
        let mut rows = self.scaffold.rows.iter();
        if let Some(first) = rows.next() {
            new_start += first.length();
        }
        for row in rows {
            if row.is_gap() {
                new_start += row.length();
            } else {
                break;
            }
        }
        self.bait.start() - new_start
    }

    /// What `end_overhang` would become were the last row (and the gaps
    /// before it) discarded.
    pub fn overhang_if_end_removed(&self) -> i64 {
        let mut new_end = self.end;
        let mut rows = self.scaffold.rows.iter().rev();
        if let Some(last) = rows.next() {
            new_end -= last.length();
        }
        for row in rows {
            if row.is_gap() {
                new_end -= row.length();
            } else {
                break;
            }
        }
        new_end - self.bait.end()
    }

    /// Discard a terminal row whose overlap with the bait is smaller than
    /// the map resolution error while the result overhangs the bait by more
    /// than it. A single row longer than the error is never discarded.
    pub fn trim_large_overhangs(&mut self, err_length: i64) {
        if self.scaffold.rows.len() == 1 && self.scaffold.rows[0].length() > err_length {
            return;
        }

        if self.start_overhang() > err_length && self.start_row_bait_overlap() < err_length {
            let discard = self.scaffold.rows.remove(0);
            self.start += discard.length();
        }

        if !self.scaffold.rows.is_empty()
            && self.end_overhang() > err_length
            && self.end_row_bait_overlap() < err_length
        {
            let discard = self.scaffold.rows.pop().unwrap();
            self.end -= discard.length();
        }

        self.remove_leading_and_trailing_gaps();
    }

    fn is_first_row(&self, frag: &Fragment) -> bool {
        matches!(self.scaffold.rows.first(), Some(Row::Fragment(f)) if f == frag)
    }

    fn is_last_row(&self, frag: &Fragment) -> bool {
        matches!(self.scaffold.rows.last(), Some(Row::Fragment(f)) if f == frag)
    }

    /// The first base, in the fragment's own coordinates, of the portion of
    /// `frag` this result would claim were its bait overhangs trimmed away.
    /// Used to order the claimants when a shared fragment is cut.
    pub fn fragment_start_if_trimmed(&self, frag: &Fragment) -> Result<i64> {
        let (start, _) = self.claimed_fragment_region(frag)?;
        Ok(start)
    }

    /// The sub-interval of `frag` left after trimming each terminal
    /// overhang, mapped through the fragment's strand.
    pub fn claimed_fragment_region(&self, frag: &Fragment) -> Result<(i64, i64)> {
        let mut fs = frag.start();
        let mut fe = frag.end();
        let mut terminal = false;
        if self.is_first_row(frag) {
            terminal = true;
            let d = self.start_overhang().max(0);
            if frag.strand() == -1 {
                fe -= d;
            } else {
                fs += d;
            }
        }
        if self.is_last_row(frag) {
            terminal = true;
            let d = self.end_overhang().max(0);
            if frag.strand() == -1 {
                fs += d;
            } else {
                fe -= d;
            }
        }
        if !terminal {
            bail!(
                "Fragment {} is not a terminal row of:\n{}",
                frag,
                self
            );
        }
        Ok((fs, fe))
    }

    /// Replace the terminal row matching `frag` with a new, shorter
    /// fragment spanning `new_start..=new_end` of it, tagged `Cut` plus all
    /// non-`Painted` bait tags. `start`/`end` move to follow the trimmed
    /// coordinates.
    pub fn cut_terminal_fragment(
        &mut self,
        frag: &Fragment,
        new_start: i64,
        new_end: i64,
    ) -> Result<Fragment> {
        if new_start < frag.start() || new_end > frag.end() {
            bail!(
                "Cut {new_start}-{new_end} outside fragment {frag}"
            );
        }
        let mut tags = vec!["Cut".to_string()];
        tags.extend(
            self.bait
                .tags()
                .iter()
                .filter(|t| *t != "Painted")
                .cloned(),
        );
        let new_frag =
            Fragment::with_tags(frag.name(), new_start, new_end, frag.strand(), tags)?;

        // Trim amounts on the scaffold-left and scaffold-right side of the
        // row, which depend on the fragment's strand in the input scaffold.
        let (left, right) = if frag.strand() == -1 {
            (frag.end() - new_end, new_start - frag.start())
        } else {
            (new_start - frag.start(), frag.end() - new_end)
        };

        let first = self.is_first_row(frag);
        let last = self.is_last_row(frag);
        if !first && !last {
            bail!("Fragment {} is not a terminal row of:\n{}", frag, self);
        }
        if first {
            self.start += left;
            self.scaffold.rows[0] = Row::Fragment(new_frag.clone());
        }
        if last {
            self.end -= right;
            let i = self.scaffold.rows.len() - 1;
            self.scaffold.rows[i] = Row::Fragment(new_frag.clone());
        }
        Ok(new_frag)
    }

    /// Freeze into a plain scaffold, reversed when the bait was placed on
    /// the reverse strand.
    pub fn to_scaffold(self) -> Scaffold {
        if self.bait.strand() == -1 {
            self.scaffold.reverse()
        } else {
            self.scaffold
        }
    }
}

impl fmt::Display for OverlapResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.scaffold.name)?;
        writeln!(f, "  length: {:>14}", underscored(self.length()))?;
        writeln!(
            f,
            "  bait:   {:>14}  {}",
            underscored(self.bait.length()),
            self.bait
        )?;
        writeln!(f, "  diff:   {:>14}", underscored(self.length_error()))?;
        writeln!(f, "  overhang: {}", self.start_overhang())?;
        let mut p = self.start - 1;
        for row in &self.scaffold.rows {
            writeln!(
                f,
                "    {:>12} {:>12} {:>11}  {}",
                underscored(p + 1),
                underscored(p + row.length()),
                underscored(row.length()),
                row
            )?;
            p += row.length();
        }
        writeln!(f, "  overhang: {}", self.end_overhang())
    }
}
