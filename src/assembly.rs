//! # Assembly
//!
//! A named collection of [`Scaffold`]s with header text, natural-key
//! sorting and junction-set computation. The Hi-C map resolution is parsed
//! lazily from the header when first asked for.
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

use crate::fragment::{Fragment, Junction};
use crate::scaffold::Scaffold;

/// Roman numerals recognised by the natural sort, for nematode chromosome
/// names. "V" is not included because it is a sex chromosome in the UV
/// system in plants, and sorts in the correct order within nematode
/// chromosomes anyway.
pub const ROMAN_CHR_INT: &[(&str, i64)] = &[("I", 1), ("II", 2), ("III", 3), ("IV", 4)];

/// One token of a natural sort key. Numeric runs order before text so that
/// comparisons between keys of different shapes stay well defined.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyPart {
    Num(i64),
    Text(String),
}

fn natural_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(I+V?|\d+)").unwrap())
}

/// Split a name into alternating text and integer runs, mapping recognised
/// Roman numerals through `table`.
pub fn natural_key_with(name: &str, table: &[(&str, i64)]) -> Vec<KeyPart> {
    let mut key = Vec::new();
    let mut last = 0;
    for m in natural_key_re().find_iter(name) {
        key.push(KeyPart::Text(name[last..m.start()].to_string()));
        let token = m.as_str();
        let num = table
            .iter()
            .find(|(r, _)| *r == token)
            .map(|(_, n)| *n)
            .or_else(|| token.parse().ok());
        match num {
            Some(n) => key.push(KeyPart::Num(n)),
            None => key.push(KeyPart::Text(token.to_string())),
        }
        last = m.end();
    }
    key.push(KeyPart::Text(name[last..].to_string()));
    key
}

pub fn natural_key(name: &str) -> Vec<KeyPart> {
    natural_key_with(name, ROMAN_CHR_INT)
}

/// The assembly-name prefix of a scaffold name: letters followed by digits
/// before the first underscore, lowercased. `hap1_scaffold_3` gives
/// `Some("hap1")`, `scaffold_3` gives `None`.
pub fn name_prefix(name: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^([A-Za-z]+\d+)_").unwrap());
    re.captures(name).map(|m| m[1].to_lowercase())
}

#[derive(Debug, Default)]
pub struct Assembly {
    pub name: String,
    pub header: Vec<String>,
    pub scaffolds: Vec<Scaffold>,
    /// Set on assemblies holding curated sequence (primary and haplotype
    /// output assemblies), used when naming output files.
    pub curated: bool,
    bp_per_texel: OnceCell<Option<f64>>,
}

impl Assembly {
    pub fn new(name: impl Into<String>) -> Assembly {
        Assembly {
            name: name.into(),
            ..Assembly::default()
        }
    }

    pub fn add_header_line(&mut self, txt: impl Into<String>) {
        self.header.push(txt.into());
    }

    pub fn add_scaffold(&mut self, scffld: Scaffold) {
        self.scaffolds.push(scffld);
    }

    /// The map resolution from a `HiC MAP RESOLUTION: <f> bp/texel` header
    /// line, parsed on first access.
    pub fn bp_per_texel(&self) -> Option<f64> {
        *self.bp_per_texel.get_or_init(|| {
            static RE: OnceLock<Regex> = OnceLock::new();
            let re = RE.get_or_init(|| {
                Regex::new(r"^HiC MAP RESOLUTION: ([\d.]+) bp/texel").unwrap()
            });
            let mut bpt = None;
            for txt in &self.header {
                if let Some(m) = re.captures(txt) {
                    bpt = m[1].parse().ok();
                }
            }
            bpt
        })
    }

    pub fn set_bp_per_texel(&self, bp_per_texel: f64) {
        let _ = self.bp_per_texel.set(Some(bp_per_texel));
    }

    pub fn length(&self) -> i64 {
        self.scaffolds.iter().map(Scaffold::length).sum()
    }

    pub fn fragments_length(&self) -> i64 {
        self.scaffolds.iter().map(Scaffold::fragments_length).sum()
    }

    pub fn gaps_length(&self) -> i64 {
        self.scaffolds.iter().map(Scaffold::gaps_length).sum()
    }

    pub fn junction_set(&self) -> Result<HashSet<Junction>> {
        let mut junctions = HashSet::new();
        for scffld in &self.scaffolds {
            junctions.extend(scffld.junction_set()?);
        }
        Ok(junctions)
    }

    /// Junction sets keyed by the [`name_prefix`] of each scaffold's first
    /// fragment, so that breaks can be attributed to the haplotype the
    /// sequence came from.
    pub fn junctions_by_name_prefix(&self) -> Result<HashMap<Option<String>, HashSet<Junction>>> {
        let mut prefix_junctions: HashMap<Option<String>, HashSet<Junction>> = HashMap::new();
        for scffld in &self.scaffolds {
            let Some(first) = scffld.first_fragment() else {
                continue;
            };
            prefix_junctions
                .entry(name_prefix(first.name()))
                .or_default()
                .extend(scffld.junction_set()?);
        }
        Ok(prefix_junctions)
    }

    pub fn scaffolds_sorted_by_name(&mut self) {
        self.scaffolds
            .sort_by_cached_key(|s| natural_key(&s.name));
    }

    /// Sort scaffolds by `(rank, natural key)`. The sort is stable, so
    /// scaffolds with equal keys keep their relative order.
    pub fn smart_sort_scaffolds(&mut self) {
        self.scaffolds
            .sort_by_cached_key(|s| (s.rank, natural_key(&s.name)));
    }

    /// All-vs-all check for input fragments appearing twice in the built
    /// assembly. Expensive; used by tests and sanity checks.
    pub fn find_overlapping_fragments(&self) -> Vec<(Fragment, Fragment)> {
        let frags: Vec<&Fragment> = self
            .scaffolds
            .iter()
            .flat_map(|s| s.fragments())
            .collect();
        let mut over_pairs = Vec::new();
        for i in 0..frags.len() {
            for j in (i + 1)..frags.len() {
                if frags[i].overlaps(frags[j]) {
                    over_pairs.push((frags[i].clone(), frags[j].clone()));
                }
            }
        }
        over_pairs
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Assembly: {}", self.name)?;
        for line in &self.header {
            writeln!(f, "  # {line}")?;
        }
        for scffld in &self.scaffolds {
            writeln!(f)?;
            for line in scffld.to_string().lines() {
                writeln!(f, "  {line}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::Gap;
    use crate::scaffold::{Rank, Row};

    fn named(name: &str, rank: Rank) -> Scaffold {
        let mut s = Scaffold::new(name);
        s.rank = rank;
        s
    }

    #[test]
    fn natural_keys() {
        assert!(natural_key("scaffold_2") < natural_key("scaffold_10"));
        assert!(natural_key("SUPER_9") < natural_key("SUPER_10"));
        assert!(natural_key("X") < natural_key("X1"));
        // Roman numerals for nematode chromosomes
        assert!(natural_key("II") < natural_key("III"));
        assert!(natural_key("III") < natural_key("IV"));
    }

    #[test]
    fn smart_sort_orders_by_rank_then_name() {
        let mut asm = Assembly::new("test");
        asm.add_scaffold(named("scaffold_12", Rank::Unplaced));
        asm.add_scaffold(named("SUPER_10", Rank::Autosome));
        asm.add_scaffold(named("scaffold_2", Rank::Unplaced));
        asm.add_scaffold(named("SUPER_X", Rank::Named));
        asm.add_scaffold(named("SUPER_2", Rank::Autosome));
        asm.smart_sort_scaffolds();
        let names: Vec<&str> = asm.scaffolds.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            vec!["SUPER_2", "SUPER_10", "SUPER_X", "scaffold_2", "scaffold_12"],
            names
        );
    }

    #[test]
    fn bp_per_texel_from_header() {
        let mut asm = Assembly::new("test");
        asm.add_header_line("DESCRIPTION: Generated by PretextView Version 0.2.5");
        asm.add_header_line("HiC MAP RESOLUTION: 8666.611572 bp/texel");
        assert_eq!(Some(8666.611572), asm.bp_per_texel());

        let empty = Assembly::new("no header");
        assert_eq!(None, empty.bp_per_texel());
    }

    #[test]
    fn junction_prefixes() {
        let mut asm = Assembly::new("test");
        let mut s1 = Scaffold::new("s1");
        s1.add_row(Row::Fragment(
            Fragment::new("hap1_scaffold_1", 1, 100, 1).unwrap(),
        ));
        s1.add_row(Row::Gap(Gap::new(200, "scaffold")));
        s1.add_row(Row::Fragment(
            Fragment::new("hap1_scaffold_1", 301, 400, 1).unwrap(),
        ));
        asm.add_scaffold(s1);
        let by_prefix = asm.junctions_by_name_prefix().unwrap();
        assert_eq!(1, by_prefix.len());
        assert_eq!(1, by_prefix[&Some("hap1".to_string())].len());
    }
}
