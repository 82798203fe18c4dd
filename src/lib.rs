//! # pretext-to-asm
//!
//! Rebuilds a curated genome assembly from the assembly that was fed into
//! the PretextView Hi-C contact map viewer and the AGP of structural edits
//! the curator made in it. Coordinates in the curated map are quantised to
//! the map's texel resolution; the work of this crate is re-projecting the
//! curator's breaks, joins, inversions and taggings onto the exact
//! base-pair coordinates of the input assembly, so that every retained
//! base of input sequence appears exactly once in the output assemblies.
pub mod assembly;
pub mod build;
pub mod cli;
pub mod fasta;
pub mod fragment;
pub mod gap;
pub mod indexed_assembly;
pub mod io;
pub mod naming;
pub mod output;
pub mod overlap_result;
pub mod resolver;
pub mod scaffold;
pub mod stats;
pub mod table;
pub mod utils;

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use log::info;

use crate::assembly::Assembly;
use crate::build::{AsmKey, BuildAssembly, BuildOptions};
use crate::gap::Gap;
use crate::indexed_assembly::IndexedAssembly;
use crate::io::AssemblyFormat;
use crate::stats::AssemblyStats;

/// The command line arguments do not make a runnable job, e.g. the curated
/// map carries no texel resolution because `-a` and `-p` were swapped.
#[derive(Debug)]
pub struct InvocationError(pub String);

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InvocationError {}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub assembly_file: PathBuf,
    pub pretext_file: PathBuf,
    pub output_file: Option<PathBuf>,
    pub autosome_prefix: String,
    pub clobber: bool,
    pub max_contig_length: Option<i64>,
    pub allow_consecutive_autosomes: bool,
}

/// The complete job: parse both assemblies, re-map the curation onto the
/// input coordinates, write the output files (or pretty-print to stdout)
/// and log the curation statistics.
pub fn run(config: &RunConfig) -> Result<()> {
    let (asm, fai) = io::parse_assembly_file(&config.assembly_file, AssemblyFormat::Tpf)?;
    let input_asm = IndexedAssembly::from_assembly(asm)?;
    let (prtxt_asm, _) = io::parse_assembly_file(&config.pretext_file, AssemblyFormat::Agp)?;

    // Trap the -a and -p arguments being switched
    if prtxt_asm.bp_per_texel().is_none() {
        return Err(InvocationError(format!(
            "No bp_per_texel value in the PretextView AGP file '{}'\n\
             (Are the -a, --assembly and -p, --pretext arguments the right way around?)",
            config.pretext_file.display()
        ))
        .into());
    }

    let mut stats = AssemblyStats::new();
    stats.record_input(&input_asm)?;

    let build_name = config
        .output_file
        .as_deref()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    let mut build_asm = BuildAssembly::new(
        build_name,
        BuildOptions {
            autosome_prefix: config.autosome_prefix.clone(),
            default_gap: Gap::new(200, "scaffold"),
            max_contig_length: config.max_contig_length,
            allow_consecutive_autosomes: config.allow_consecutive_autosomes,
        },
    );
    build_asm.remap_to_input_assembly(&prtxt_asm, &input_asm)?;
    stats.cuts = build_asm.cuts();

    let out_assemblies = build_asm.output_assemblies()?;
    stats.make_stats(&out_assemblies)?;

    let out_assemblies = if let Some(output_file) = &config.output_file {
        let template = output::parse_output_file(output_file)?;
        let out_assemblies =
            output::name_assemblies(out_assemblies, &template.root, &template.version);
        output::write_info_yaml(output_file, &out_assemblies, &stats, config.clobber)?;
        output::write_assemblies(fai.as_ref(), &template, &out_assemblies, config.clobber)?;
        output::write_chr_csv_files(&template.dir, &out_assemblies, config.clobber)?;
        output::write_chr_report_csv(output_file, &out_assemblies, config.clobber)?;
        out_assemblies
    } else {
        print_assemblies(&out_assemblies);
        out_assemblies
    };

    for out_asm in out_assemblies.values() {
        stats.log_assembly_chromosomes(out_asm);
    }
    info!("");
    stats.log_curation_stats();
    stats.log_sanity_checks(&out_assemblies);
    Ok(())
}

fn print_assemblies(out_assemblies: &indexmap::IndexMap<AsmKey, Assembly>) {
    for out_asm in out_assemblies.values() {
        println!();
        println!("{out_asm}");
    }
}
