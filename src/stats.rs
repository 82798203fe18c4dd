//! # Curation statistics
//!
//! Breaks, joins and cuts are recovered by comparing the junction sets of
//! the input and output assemblies: a junction present only in the input
//! was broken by the curator, one present only in the output was joined.
//! Also computes the per-chromosome length tables behind the chromosome
//! report and the assembly summaries logged at the end of a run.
use std::collections::{HashMap, HashSet};

use anyhow::Result;
use indexmap::IndexMap;
use log::{info, warn};

use crate::assembly::Assembly;
use crate::build::AsmKey;
use crate::fragment::Junction;
use crate::indexed_assembly::IndexedAssembly;
use crate::scaffold::Rank;
use crate::utils::underscored;

pub fn rank_label(rank: Rank) -> &'static str {
    match rank {
        Rank::Unset => "unranked",
        Rank::Autosome => "autosome",
        Rank::Named => "named_chromosome",
        Rank::Unplaced => "unplaced",
    }
}

#[derive(Default)]
pub struct AssemblyStats {
    pub cuts: usize,
    pub breaks: usize,
    pub joins: usize,
    input_junctions: HashSet<Junction>,
    input_junctions_by_prefix: HashMap<Option<String>, HashSet<Junction>>,
    input_fragments_length: i64,
}

impl AssemblyStats {
    pub fn new() -> AssemblyStats {
        AssemblyStats::default()
    }

    /// Capture the junction sets of the input assembly before building.
    pub fn record_input(&mut self, input_asm: &IndexedAssembly) -> Result<()> {
        self.input_fragments_length = input_asm.fragments_length();
        for scffld in input_asm.scaffolds() {
            let junctions = scffld.junction_set()?;
            self.input_junctions.extend(junctions.iter().cloned());
            let prefix = scffld
                .first_fragment()
                .and_then(|f| crate::assembly::name_prefix(f.name()));
            self.input_junctions_by_prefix
                .entry(prefix)
                .or_default()
                .extend(junctions);
        }
        Ok(())
    }

    /// Count breaks and joins against the union of output junctions.
    /// Breaks are accumulated per input name prefix, which partitions the
    /// input junction set, so scaffolds migrating between haplotypes are
    /// not double-counted.
    pub fn make_stats(&mut self, output_assemblies: &IndexMap<AsmKey, Assembly>) -> Result<()> {
        let mut output_set: HashSet<Junction> = HashSet::new();
        for asm in output_assemblies.values() {
            output_set.extend(asm.junction_set()?);
        }

        self.breaks = self
            .input_junctions_by_prefix
            .values()
            .map(|junctions| junctions.difference(&output_set).count())
            .sum();
        self.joins = output_set.difference(&self.input_junctions).count();
        Ok(())
    }

    pub fn log_curation_stats(&self) {
        let cut_plural = if self.cuts == 1 {
            "cut in a contig"
        } else {
            "cuts in contigs"
        };
        let break_plural = if self.breaks == 1 {
            "break at a gap"
        } else {
            "breaks at gaps"
        };
        let join_plural = if self.joins == 1 { "join" } else { "joins" };
        info!(
            "Curation made {} {cut_plural}, {} {break_plural} and {} {join_plural}",
            self.cuts, self.breaks, self.joins
        );
    }

    /// Every base of retained input sequence should appear exactly once
    /// across the output assemblies.
    pub fn log_sanity_checks(&self, output_assemblies: &IndexMap<AsmKey, Assembly>) {
        let output_length: i64 = output_assemblies
            .values()
            .map(Assembly::fragments_length)
            .sum();
        if output_length == self.input_fragments_length {
            info!(
                "All {} bp of input sequence accounted for in output",
                underscored(output_length)
            );
        } else {
            warn!(
                "Output sequence length {} differs from input sequence length {}",
                underscored(output_length),
                underscored(self.input_fragments_length)
            );
        }
    }

    pub fn log_assembly_chromosomes(&self, asm: &Assembly) {
        let ranked = scaffold_lengths_by_rank(asm);

        info!("");
        info!("{}", asm.name);
        info!(
            "    {:>15}  bp sequence (minus gaps)",
            underscored(asm.fragments_length())
        );
        let is_main = ranked
            .keys()
            .any(|r| matches!(r, Rank::Autosome | Rank::Named));
        for (rank, name_length) in &ranked {
            if is_main {
                info!("  {}:", rank_label(*rank));
            }
            info!("    n = {}", name_length.len());

            if *rank == Rank::Autosome || *rank == Rank::Named {
                for (name, length) in name_length {
                    log_scaffold_length(name, *length);
                }
            } else {
                // A largest ... smallest summary for unplaced scaffolds
                let mut by_size: Vec<(&String, &i64)> = name_length.iter().collect();
                by_size.sort_by_key(|(_, l)| std::cmp::Reverse(**l));
                if let Some(&(name, length)) = by_size.first() {
                    log_scaffold_length(name, *length);
                }
                if by_size.len() == 3 {
                    log_scaffold_length(by_size[1].0, *by_size[1].1);
                } else if by_size.len() > 2 {
                    info!("                ...  ...");
                }
                if by_size.len() > 1 {
                    let (name, length) = by_size[by_size.len() - 1];
                    log_scaffold_length(name, *length);
                }
            }

            if name_length.len() > 1 {
                let total: i64 = name_length.values().sum();
                info!("    {:>15}  bp total", underscored(total));
            }
        }
    }
}

fn log_scaffold_length(name: &str, length: i64) {
    info!("    {:>15}  {}", underscored(length), name);
}

/// Sequence lengths keyed by scaffold name within each rank. Autosome and
/// named-chromosome scaffolds merge consecutive runs sharing an
/// `original_name`, so a chromosome and its unlocs are summed under the
/// chromosome's name.
pub fn scaffold_lengths_by_rank(asm: &Assembly) -> IndexMap<Rank, IndexMap<String, i64>> {
    let mut ranked: IndexMap<Rank, IndexMap<String, i64>> = IndexMap::new();
    let mut last_chr_key: Option<(Rank, String, String)> = None;

    for scffld in &asm.scaffolds {
        let rank = scffld.rank;
        let length = scffld.fragments_length();
        if matches!(rank, Rank::Autosome | Rank::Named) {
            let orig = scffld.original_name.clone().unwrap_or_default();
            let merged = match &last_chr_key {
                Some((last_rank, last_orig, name))
                    if *last_rank == rank && *last_orig == orig =>
                {
                    Some(name.clone())
                }
                _ => None,
            };
            let key = merged.unwrap_or_else(|| scffld.name.clone());
            *ranked
                .entry(rank)
                .or_default()
                .entry(key.clone())
                .or_insert(0) += length;
            last_chr_key = Some((rank, orig, key));
        } else {
            ranked
                .entry(rank)
                .or_default()
                .insert(scffld.name.clone(), length);
            last_chr_key = None;
        }
    }
    ranked
}

/// Rows for a curated assembly's `chromosome.list.csv`: scaffold name,
/// chromosome, and whether the scaffold is localised on the chromosome.
pub fn chromosome_list_rows(asm: &Assembly) -> Vec<(String, String, &'static str)> {
    let mut rows = Vec::new();
    for scffld in &asm.scaffolds {
        if !matches!(scffld.rank, Rank::Autosome | Rank::Named) {
            continue;
        }
        let chr = scffld
            .chr_name
            .clone()
            .unwrap_or_else(|| scffld.name.clone());
        rows.push((
            scffld.name.clone(),
            chr,
            if scffld.localised { "yes" } else { "no" },
        ));
    }
    rows
}

/// Number of distinct chromosomes (merged with their unlocs) in an
/// assembly, or `None` when it has no ranked chromosomes.
pub fn chromosome_count(asm: &Assembly) -> Option<usize> {
    let ranked = scaffold_lengths_by_rank(asm);
    let n: usize = ranked
        .iter()
        .filter(|(rank, _)| matches!(rank, Rank::Autosome | Rank::Named))
        .map(|(_, name_length)| name_length.len())
        .sum();
    if n == 0 {
        None
    } else {
        Some(n)
    }
}

/// Whole-scaffold lengths check, used by tests: every output fragment must
/// lie within the input fragment bounds of its scaffold.
pub fn assert_fragments_within_input(
    outputs: &IndexMap<AsmKey, Assembly>,
    input: &IndexedAssembly,
) -> Result<()> {
    let mut input_bounds: HashMap<String, (i64, i64)> = HashMap::new();
    for scffld in input.scaffolds() {
        for frag in scffld.fragments() {
            let bounds = input_bounds
                .entry(frag.name().to_string())
                .or_insert((frag.start(), frag.end()));
            bounds.0 = bounds.0.min(frag.start());
            bounds.1 = bounds.1.max(frag.end());
        }
    }
    for asm in outputs.values() {
        for scffld in &asm.scaffolds {
            for frag in scffld.fragments() {
                let Some((min, max)) = input_bounds.get(frag.name()) else {
                    anyhow::bail!("Output fragment {frag} has no input scaffold");
                };
                if frag.start() < *min || frag.end() > *max {
                    anyhow::bail!(
                        "Output fragment {frag} outside input bounds {min}-{max}"
                    );
                }
            }
        }
    }
    Ok(())
}
