//! # Scaffold
//!
//! An ordered concatenation of [`Fragment`]s and [`Gap`]s representing one
//! output sequence, together with the curation metadata attached while the
//! assembly is being rebuilt (rank, haplotype, disposition tag, the name and
//! tags it carried in the curated map).
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use anyhow::Result;

use crate::fragment::{Fragment, Junction};
use crate::gap::Gap;
use crate::utils::underscored;

/// One row of a scaffold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Fragment(Fragment),
    Gap(Gap),
}

impl Row {
    pub fn length(&self) -> i64 {
        match self {
            Row::Fragment(f) => f.length(),
            Row::Gap(g) => g.length(),
        }
    }

    pub fn as_fragment(&self) -> Option<&Fragment> {
        match self {
            Row::Fragment(f) => Some(f),
            Row::Gap(_) => None,
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, Row::Gap(_))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::Fragment(frag) => frag.fmt(f),
            Row::Gap(gap) => gap.fmt(f),
        }
    }
}

/// Scaffold classification. `Autosome` scaffolds are curated chromosomes
/// awaiting a number, `Named` ones carry an explicit chromosome name tag
/// (sex and B chromosomes), `Unplaced` everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum Rank {
    #[default]
    Unset,
    Autosome,
    Named,
    Unplaced,
}

/// Disposition assigned from curator tags, routing a scaffold into its own
/// output assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaffoldTag {
    Contaminant,
    Haplotig,
    FalseDuplicate,
}

impl ScaffoldTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaffoldTag::Contaminant => "Contaminant",
            ScaffoldTag::Haplotig => "Haplotig",
            ScaffoldTag::FalseDuplicate => "FalseDuplicate",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scaffold {
    pub name: String,
    pub rows: Vec<Row>,
    pub rank: Rank,
    pub haplotype: Option<String>,
    pub tag: Option<ScaffoldTag>,
    pub original_name: Option<String>,
    pub original_tags: BTreeSet<String>,
    pub chr_name: Option<String>,
    pub localised: bool,
}

impl Scaffold {
    pub fn new(name: impl Into<String>) -> Scaffold {
        Scaffold {
            name: name.into(),
            ..Scaffold::default()
        }
    }

    pub fn with_rows(name: impl Into<String>, rows: Vec<Row>) -> Scaffold {
        Scaffold {
            name: name.into(),
            rows,
            ..Scaffold::default()
        }
    }

    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn length(&self) -> i64 {
        self.rows.iter().map(Row::length).sum()
    }

    pub fn fragments_length(&self) -> i64 {
        self.fragments().map(Fragment::length).sum()
    }

    pub fn gaps_length(&self) -> i64 {
        self.rows
            .iter()
            .filter(|r| r.is_gap())
            .map(Row::length)
            .sum()
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.rows.iter().filter_map(Row::as_fragment)
    }

    pub fn first_fragment(&self) -> Option<&Fragment> {
        self.fragments().next()
    }

    /// The union of all tags on all fragments, in sorted order.
    pub fn fragment_tags(&self) -> BTreeSet<String> {
        let mut tag_set = BTreeSet::new();
        for frag in self.fragments() {
            for t in frag.tags() {
                tag_set.insert(t.clone());
            }
        }
        tag_set
    }

    /// A copy with the row order and every fragment strand flipped.
    /// Metadata is carried over unchanged.
    pub fn reverse(&self) -> Scaffold {
        let mut new = self.clone();
        new.rows = self
            .rows
            .iter()
            .rev()
            .map(|row| match row {
                Row::Fragment(f) => Row::Fragment(f.reverse()),
                Row::Gap(g) => Row::Gap(g.clone()),
            })
            .collect();
        new
    }

    /// Append another scaffold's rows, separated by `gap` unless this
    /// scaffold is still empty.
    pub fn append_scaffold(&mut self, othr: Scaffold, gap: Option<&Gap>) {
        if let Some(gap) = gap {
            if !self.rows.is_empty() {
                self.add_row(Row::Gap(gap.clone()));
            }
        }
        self.rows.extend(othr.rows);
    }

    /// The set of junctions between consecutive fragments. Gaps do not
    /// interrupt a junction.
    pub fn junction_set(&self) -> Result<HashSet<Junction>> {
        let mut junctions = HashSet::new();
        let mut itr = self.fragments();
        let Some(mut prev) = itr.next() else {
            return Ok(junctions);
        };
        for this in itr {
            junctions.insert(prev.junction(this)?);
            prev = this;
        }
        Ok(junctions)
    }
}

impl fmt::Display for Scaffold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(orig) = &self.original_name {
            if orig != &self.name {
                write!(f, " ({orig})")?;
            }
        }
        if self.rank != Rank::Unset {
            write!(f, " rank={}", self.rank as u8)?;
        }
        writeln!(f)?;
        for row in &self.rows {
            writeln!(f, "  {:>14}  {}", underscored(row.length()), row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_scaffold() -> Scaffold {
        Scaffold::with_rows(
            "scaffold_1",
            vec![
                Row::Fragment(Fragment::new("cmpnt_1", 1, 100, 1).unwrap()),
                Row::Gap(Gap::new(200, "scaffold")),
                Row::Fragment(Fragment::new("cmpnt_1", 301, 500, -1).unwrap()),
            ],
        )
    }

    #[test]
    fn lengths() {
        let s = example_scaffold();
        assert_eq!(500, s.length());
        assert_eq!(300, s.fragments_length());
        assert_eq!(200, s.gaps_length());
    }

    #[test]
    fn reverse_flips_rows_and_strands() {
        let s = example_scaffold();
        let r = s.reverse();
        assert_eq!(3, r.rows.len());
        let frags: Vec<&Fragment> = r.fragments().collect();
        assert_eq!(301, frags[0].start());
        assert_eq!(1, frags[0].strand());
        assert_eq!(-1, frags[1].strand());
        assert_eq!(s.length(), r.length());
    }

    #[test]
    fn junctions_survive_reversal() {
        let s = Scaffold::with_rows(
            "s",
            vec![
                Row::Fragment(Fragment::new("a", 1, 100, 1).unwrap()),
                Row::Gap(Gap::new(200, "scaffold")),
                Row::Fragment(Fragment::new("b", 1, 50, -1).unwrap()),
                Row::Fragment(Fragment::new("c", 11, 60, -1).unwrap()),
            ],
        );
        let fwd = s.junction_set().unwrap();
        let rev = s.reverse().junction_set().unwrap();
        assert_eq!(fwd, rev);
        assert_eq!(2, fwd.len());
    }

    #[test]
    fn append_inserts_gap_only_when_non_empty() {
        let gap = Gap::new(200, "scaffold");
        let mut s = Scaffold::new("fused");
        s.append_scaffold(example_scaffold(), Some(&gap));
        assert_eq!(3, s.rows.len());
        s.append_scaffold(example_scaffold(), Some(&gap));
        assert_eq!(7, s.rows.len());
        assert!(s.rows[3].is_gap());
    }

    #[test]
    fn rank_ordering() {
        assert!(Rank::Unset < Rank::Autosome);
        assert!(Rank::Autosome < Rank::Named);
        assert!(Rank::Named < Rank::Unplaced);
    }
}
