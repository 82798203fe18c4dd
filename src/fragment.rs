//! # Fragment
//!
//! A [`Fragment`] is an interval of a named input-assembly scaffold with a
//! strand, the basic unit of sequence that curation shuffles around. Two
//! adjacent fragments in a scaffold form a [`Junction`], encoded so that
//! reversing the whole scaffold produces the same junction set.
use anyhow::{bail, Result};
use std::fmt;

/// Identity of a fragment in the found-fragment tables: `(name, start, end)`.
/// Strand and tags are deliberately not part of the key.
pub type FragmentKey = (String, i64, i64);

/// One element of a [`Junction`]. Names and coordinates are kept as distinct
/// variants so that a scaffold called `"12345"` cannot collide with a
/// coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JunctionPart {
    Coord(i64),
    Name(String),
}

/// The adjacency of two consecutive fragments within a scaffold.
pub type Junction = (JunctionPart, JunctionPart, JunctionPart, JunctionPart);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    name: String,
    start: i64,
    end: i64,
    strand: i8,
    tags: Vec<String>,
}

impl Fragment {
    pub fn new(name: impl Into<String>, start: i64, end: i64, strand: i8) -> Result<Fragment> {
        Fragment::with_tags(name, start, end, strand, Vec::new())
    }

    pub fn with_tags(
        name: impl Into<String>,
        start: i64,
        end: i64,
        strand: i8,
        tags: Vec<String>,
    ) -> Result<Fragment> {
        if !matches!(strand, -1 | 0 | 1) {
            bail!("strand '{strand}' should be one of: 0, 1, -1");
        }
        if start > end {
            bail!("start '{start}' must be <= end '{end}'");
        }
        Ok(Fragment {
            name: name.into(),
            start,
            end,
            strand,
            tags,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn strand(&self) -> i8 {
        self.strand
    }

    /// Tags carried over from the curated map, empty if there are none.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn length(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn key(&self) -> FragmentKey {
        (self.name.clone(), self.start, self.end)
    }

    pub fn strand_char(&self) -> char {
        match self.strand {
            1 => '+',
            -1 => '-',
            _ => '.',
        }
    }

    pub fn overlaps(&self, othr: &Fragment) -> bool {
        self.name == othr.name && self.end >= othr.start && self.start <= othr.end
    }

    /// Length of the overlap between two fragments of the same scaffold, or
    /// `None` when the names differ or the intervals do not intersect.
    pub fn overlap_length(&self, othr: &Fragment) -> Option<i64> {
        if self.name != othr.name {
            return None;
        }
        let ovr_start = self.start.max(othr.start);
        let ovr_end = self.end.min(othr.end);
        if ovr_start > ovr_end {
            None
        } else {
            Some(ovr_end - ovr_start + 1)
        }
    }

    pub fn abuts(&self, othr: &Fragment) -> bool {
        self.name == othr.name && (self.end + 1 == othr.start || othr.end + 1 == self.start)
    }

    /// Returns `None` if the fragments overlap or are on different
    /// scaffolds, zero if they abut, and the length of the gap otherwise.
    pub fn gap_between(&self, othr: &Fragment) -> Option<i64> {
        if self.name != othr.name {
            return None;
        }
        let gap_start = self.end.min(othr.end);
        let gap_end = self.start.max(othr.start);
        if gap_start < gap_end {
            Some(gap_end - gap_start - 1)
        } else {
            None
        }
    }

    /// Encodes the positions of two adjacent fragments in a scaffold, with
    /// reverse strand ends encoded by flipping the order of the name and
    /// coordinate.
    pub fn junction(&self, othr: &Fragment) -> Result<Junction> {
        use JunctionPart::{Coord, Name};
        match (self.strand, othr.strand) {
            (1, 1) => Ok((
                //   fwd >>>                fwd >>>
                Name(self.name.clone()),
                Coord(self.end),
                Name(othr.name.clone()),
                Coord(othr.start),
            )),
            (1, -1) => Ok((
                //   fwd >>>                            <<< rev
                Name(self.name.clone()),
                Coord(self.end),
                Coord(othr.end),
                Name(othr.name.clone()),
            )),
            (-1, 1) => Ok((
                //                 <<< rev    fwd >>>
                Coord(self.start),
                Name(self.name.clone()),
                Name(othr.name.clone()),
                Coord(othr.start),
            )),
            // The rev-rev case must match fwd-fwd of the reversed pair
            (-1, -1) => Ok((
                Name(othr.name.clone()),
                Coord(othr.end),
                Name(self.name.clone()),
                Coord(self.start),
            )),
            _ => bail!("strand == 0 not supported:\n  {self}\n  {othr}"),
        }
    }

    pub fn reverse(&self) -> Fragment {
        Fragment {
            name: self.name.clone(),
            start: self.start,
            end: self.end,
            strand: -self.strand,
            tags: self.tags.clone(),
        }
    }

    pub fn rename(&self, new_name: impl Into<String>) -> Fragment {
        Fragment {
            name: new_name.into(),
            start: self.start,
            end: self.end,
            strand: self.strand,
            tags: self.tags.clone(),
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}({})",
            self.name,
            self.start,
            self.end,
            self.strand_char()
        )?;
        for tag in &self.tags {
            write!(f, " {tag}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bad_attributes() {
        assert!(Fragment::new("chr1", 1, 20_000, 2).is_err());
        assert!(Fragment::new("chr1", 101, 100, 1).is_err());
    }

    #[test]
    fn length() {
        assert_eq!(1, Fragment::new("chr1", 10, 10, 1).unwrap().length());
        assert_eq!(100, Fragment::new("chr1", 101, 200, -1).unwrap().length());
    }

    #[test]
    fn equals() {
        let f1 = Fragment::new("chr1", 1, 20_000, 1).unwrap();
        let f3 =
            Fragment::with_tags("chr1", 1, 20_000, 1, vec!["Painted".to_string()]).unwrap();
        let f5 = Fragment::new("chr2", 1, 20_000, 1).unwrap();

        assert_eq!(f1, f1.clone());
        assert_ne!(f1, f3);
        assert_ne!(f1, f5);
    }

    #[test]
    fn overlaps() {
        let f1 = Fragment::new("chr1", 1, 100, 1).unwrap();
        let f2 = Fragment::new("chr1", 100, 120, 1).unwrap();
        let f3 = Fragment::new("chr1", 121, 140, 1).unwrap();
        let f4 = Fragment::new("chr1", 140, 160, -1).unwrap();

        assert!(f1.overlaps(&f2));
        assert!(f2.overlaps(&f1));
        assert!(!f2.overlaps(&f3));
        assert!(f3.overlaps(&f4));
        assert_eq!(Some(1), f1.overlap_length(&f2));
        assert_eq!(None, f2.overlap_length(&f3));
    }

    #[test]
    fn abuts() {
        let f1 = Fragment::new("chr1", 1, 100, 1).unwrap();
        let f2 = Fragment::new("chr1", 101, 120, 1).unwrap();
        let f3 = Fragment::new("chr1", 102, 120, 1).unwrap();
        let f4 = Fragment::new("chr1", 100, 120, 1).unwrap();

        assert!(f1.abuts(&f2));
        assert!(f2.abuts(&f1));
        assert!(!f1.abuts(&f3));
        assert!(!f1.abuts(&f4));
        assert_eq!(Some(0), f1.gap_between(&f2));
        assert_eq!(Some(1), f1.gap_between(&f3));
        assert_eq!(None, f1.gap_between(&f4));
    }

    #[test]
    fn stringify() {
        let f1 = Fragment::new("chr1", 1, 20_000, 1).unwrap();
        let f2 = Fragment::new("chr1", 1, 20_000, -1).unwrap();
        let f3 = Fragment::new("chr1", 1, 20_000, 0).unwrap();

        assert_eq!("chr1:1-20000(+)", f1.to_string());
        assert_eq!("chr1:1-20000(-)", f2.to_string());
        assert_eq!("chr1:1-20000(.)", f3.to_string());
    }

    #[test]
    fn junction_matches_when_reversed() {
        let a = Fragment::new("s1", 1, 100, 1).unwrap();
        let b = Fragment::new("s2", 51, 200, -1).unwrap();

        let fwd = a.junction(&b).unwrap();
        let rev = b.reverse().junction(&a.reverse()).unwrap();
        assert_eq!(fwd, rev);

        let mut set = HashSet::new();
        set.insert(fwd);
        assert!(set.contains(&rev));
    }

    #[test]
    fn junction_strand_zero_is_error() {
        let a = Fragment::new("s1", 1, 100, 0).unwrap();
        let b = Fragment::new("s2", 51, 200, 1).unwrap();
        assert!(a.junction(&b).is_err());
    }
}
