//! # IndexedAssembly
//!
//! The input assembly wrapped in a per-scaffold prefix-sum index so that
//! bait lookups run a binary search instead of a linear scan. Curated maps
//! can hold millions of baits against scaffolds with thousands of rows, so
//! per-bait linear scans would be quadratic.
use anyhow::{bail, Result};
use indexmap::IndexMap;

use crate::assembly::Assembly;
use crate::fragment::Fragment;
use crate::overlap_result::OverlapResult;
use crate::scaffold::Scaffold;

pub struct IndexedAssembly {
    pub name: String,
    pub header: Vec<String>,
    scaffolds: IndexMap<String, IndexedScaffold>,
}

struct IndexedScaffold {
    scaffold: Scaffold,
    /// `idx[i]` is the cumulative length of rows `0..=i`, so row `i`
    /// occupies `1 + idx[i-1] ..= idx[i]` in scaffold coordinates.
    idx: Vec<i64>,
}

impl IndexedAssembly {
    pub fn new(name: impl Into<String>) -> IndexedAssembly {
        IndexedAssembly {
            name: name.into(),
            header: Vec::new(),
            scaffolds: IndexMap::new(),
        }
    }

    pub fn from_assembly(asm: Assembly) -> Result<IndexedAssembly> {
        let mut indexed = IndexedAssembly::new(asm.name);
        indexed.header = asm.header;
        for scffld in asm.scaffolds {
            indexed.add_scaffold(scffld)?;
        }
        Ok(indexed)
    }

    pub fn add_scaffold(&mut self, scffld: Scaffold) -> Result<()> {
        if self.scaffolds.contains_key(&scffld.name) {
            bail!("Already have Scaffold named '{}'", scffld.name);
        }

        let mut end = 0;
        let mut idx = Vec::with_capacity(scffld.rows.len());
        for row in &scffld.rows {
            end += row.length();
            idx.push(end);
        }

        self.scaffolds
            .insert(scffld.name.clone(), IndexedScaffold { scaffold: scffld, idx });
        Ok(())
    }

    pub fn scaffolds(&self) -> impl Iterator<Item = &Scaffold> {
        self.scaffolds.values().map(|e| &e.scaffold)
    }

    pub fn scaffold_by_name(&self, name: &str) -> Result<&Scaffold> {
        match self.scaffolds.get(name) {
            Some(entry) => Ok(&entry.scaffold),
            None => bail!("No such Scaffold '{}' in Assembly '{}'", name, self.name),
        }
    }

    pub fn fragments_length(&self) -> i64 {
        self.scaffolds().map(Scaffold::fragments_length).sum()
    }

    /// Given a bait fragment, returns an [`OverlapResult`] holding the rows
    /// of the named scaffold which overlap the bait's interval, with any
    /// leading or trailing gaps removed, or `None` when only gaps (or
    /// nothing) overlap.
    pub fn find_overlaps(&self, bait: &Fragment) -> Result<Option<OverlapResult>> {
        let Some(entry) = self.scaffolds.get(bait.name()) else {
            bail!(
                "No such Scaffold '{}' in Assembly '{}'",
                bait.name(),
                self.name
            );
        };
        let scffld = &entry.scaffold;
        if scffld.rows.is_empty() {
            bail!("Scaffold '{}' is empty", scffld.name);
        }
        let idx = &entry.idx;

        let bait_start = bait.start();
        let bait_end = bait.end();
        let row_start = |i: usize| if i == 0 { 1 } else { 1 + idx[i - 1] };

        // Binary search for any row overlapping the bait
        let mut a = 0;
        let mut z = idx.len();
        let mut ovr = None;
        while a < z {
            let m = a + (z - a) / 2;
            if idx[m] < bait_start {
                // Row at "m" is to the left of the bait
                a = m + 1;
            } else if row_start(m) > bait_end {
                // Row at "m" is to the right of the bait
                z = m;
            } else {
                ovr = Some(m);
                break;
            }
        }
        let Some(ovr) = ovr else {
            return Ok(None);
        };

        // The span of overlapping rows may extend on either side of "ovr"
        let mut i_ovr = ovr;
        let mut j_ovr = ovr;
        while i_ovr > 0 && idx[i_ovr - 1] >= bait_start {
            i_ovr -= 1;
        }
        while j_ovr + 1 < idx.len() && row_start(j_ovr + 1) <= bait_end {
            j_ovr += 1;
        }

        // Walk the pointers inward past gaps on the ends
        while i_ovr <= j_ovr && scffld.rows[i_ovr].is_gap() {
            i_ovr += 1;
        }
        while j_ovr > i_ovr && scffld.rows[j_ovr].is_gap() {
            j_ovr -= 1;
        }
        if i_ovr > j_ovr || scffld.rows[i_ovr].is_gap() {
            return Ok(None);
        }

        let rows = scffld.rows[i_ovr..=j_ovr].to_vec();
        Ok(Some(OverlapResult::new(
            bait.clone(),
            row_start(i_ovr),
            idx[j_ovr],
            rows,
        )))
    }
}
