//! # Curation reports
//!
//! CSV and YAML summaries written alongside the output assemblies: a
//! `chromosome.list.csv` per curated assembly, a `chr_report.csv` of
//! per-chromosome sequence lengths across all assemblies, and an
//! `info.yaml` of assembly statistics and manual intervention counts.
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;

use crate::assembly::Assembly;
use crate::build::AsmKey;
use crate::stats::{
    chromosome_count, chromosome_list_rows, rank_label, scaffold_lengths_by_rank, AssemblyStats,
};

/// The `chromosome.list.csv` for one curated assembly: scaffold name,
/// chromosome, localised flag. `None` when the assembly has no
/// chromosomes.
pub fn chromosome_list_csv(asm: &Assembly) -> Result<Option<String>> {
    let rows = chromosome_list_rows(asm);
    if rows.is_empty() {
        return Ok(None);
    }
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    Ok(Some(writer_to_string(wtr)?))
}

#[derive(Debug, Serialize)]
struct ChrReportRow<'a> {
    assembly: &'a str,
    rank: &'static str,
    name: String,
    length: i64,
}

/// Per-chromosome (and per-scaffold) sequence lengths across all output
/// assemblies, chromosomes merged with their unlocs.
pub fn chr_report_csv(assemblies: &IndexMap<AsmKey, Assembly>) -> Result<Option<String>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let mut any = false;
    for asm in assemblies.values() {
        for (rank, name_lengths) in scaffold_lengths_by_rank(asm) {
            for (name, length) in name_lengths {
                any = true;
                wtr.serialize(ChrReportRow {
                    assembly: &asm.name,
                    rank: rank_label(rank),
                    name,
                    length,
                })?;
            }
        }
    }
    if !any {
        return Ok(None);
    }
    Ok(Some(writer_to_string(wtr)?))
}

#[derive(Debug, Serialize)]
pub struct AssemblyInfo {
    pub scaffold_count: usize,
    pub total_length: i64,
    pub sequence_length: i64,
    pub gap_length: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chromosome_count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct CurationInfo {
    assemblies: IndexMap<String, AssemblyInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manual_breaks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manual_joins: Option<usize>,
    manual_haplotig_removals: usize,
}

/// The `info.yaml` text: per-assembly statistics keyed by the output
/// assembly name, plus the manual intervention counts.
pub fn info_yaml(
    assemblies: &IndexMap<AsmKey, Assembly>,
    stats: &AssemblyStats,
) -> Result<String> {
    let mut asm_stats = IndexMap::new();
    for asm in assemblies.values() {
        asm_stats.insert(
            asm.name.clone(),
            AssemblyInfo {
                scaffold_count: asm.scaffolds.len(),
                total_length: asm.length(),
                sequence_length: asm.fragments_length(),
                gap_length: asm.gaps_length(),
                chromosome_count: chromosome_count(asm),
            },
        );
    }

    // The haplotig bucket is re-keyed "additional_haplotigs" when the
    // assemblies are named for their output files
    let haplotig_count = ["Haplotig", "additional_haplotigs"]
        .iter()
        .find_map(|key| assemblies.get(&Some(key.to_string())))
        .map_or(0, |asm| asm.scaffolds.len());
    let multi = asm_stats.len() > 1;
    let info = CurationInfo {
        assemblies: asm_stats,
        manual_breaks: multi.then_some(stats.breaks),
        manual_joins: multi.then_some(stats.joins),
        manual_haplotig_removals: haplotig_count,
    };
    serde_yaml::to_string(&info).context("Serialising info YAML")
}

fn writer_to_string(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Flushing CSV writer: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}
