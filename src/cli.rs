//! # Command line interface for `pretext_to_asm`
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "pretext_to_asm",
    author,
    version,
    about = "Re-maps curation from a PretextView AGP onto the assembly fed into Pretext",
    long_about = "\
Uses fragments in the assembly (AGP) produced by PretextView to find \
matching fragments in the assembly which was fed into Pretext, and outputs \
an assembly made from the input assembly fragments.

Upper case letters followed by zero or more digits are assumed to be \
chromosome names, e.g. 'X', 'W', 'B1'. Known tags are: Contaminant, \
FalseDuplicate, Haplotig, Primary, Singleton, Target and Unloc. Any other \
tag is taken to be the name of a haplotype, whose scaffolds are placed in \
separate output files."
)]
pub struct Cli {
    /// Assembly before curation, usually a FASTA file. FASTA files are
    /// indexed, creating a '.fai' and a '.agp' file alongside the assembly
    /// if they are missing or are older than the FASTA.
    #[arg(short, long, value_name = "FILE")]
    pub assembly: PathBuf,

    /// Assembly file from Pretext, which is usually an AGP
    #[arg(short, long, value_name = "FILE")]
    pub pretext: PathBuf,

    /// Output file template, typically '<ToLID>.<VERSION>.fa', e.g.
    /// 'mVulVul1.2.fa' for version 2 of the assembly of 'mVulVul1'. The
    /// output file type is determined from its extension. When the output
    /// is FASTA ('.fa'), an AGP file is also written. If not given, prints
    /// to STDOUT in a readable text format.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Prefix for naming autosomal chromosomes
    #[arg(short = 'c', long, default_value = "SUPER_")]
    pub autosome_prefix: String,

    /// Overwrite any existing output files (the default)
    #[arg(short = 'f', long, conflicts_with = "no_clobber")]
    pub clobber: bool,

    /// Fail rather than overwrite existing output files
    #[arg(long)]
    pub no_clobber: bool,

    /// Diagnostic messages to show
    #[arg(
        short = 'l',
        long,
        default_value = "info",
        value_parser = ["debug", "info", "warning", "error"]
    )]
    pub log_level: String,

    /// Write messages into a '.log' file alongside the output file (the
    /// default)
    #[arg(short = 'w', long, conflicts_with = "no_write_log")]
    pub write_log: bool,

    /// Do not write a '.log' file
    #[arg(short = 'W', long)]
    pub no_write_log: bool,

    /// Maximum output scaffold length. Longer scaffolds are split at the
    /// gaps nearest their ideal division points. Zero disables splitting.
    #[arg(long, default_value_t = 2_000_000_000, value_parser = max_contig_in_range)]
    pub max_contig_length: i64,

    /// Tolerate runs of first-haplotype scaffolds within one chromosome
    /// group when naming autosomes, lettering them instead of failing
    #[arg(long)]
    pub allow_consecutive_autosomes: bool,
}

impl Cli {
    pub fn clobber(&self) -> bool {
        !self.no_clobber
    }

    pub fn write_log(&self) -> bool {
        !self.no_write_log
    }

    pub fn max_contig_length(&self) -> Option<i64> {
        if self.max_contig_length == 0 {
            None
        } else {
            Some(self.max_contig_length)
        }
    }

    /// The level filter for `env_logger`.
    pub fn log_filter(&self) -> &str {
        match self.log_level.as_str() {
            "warning" => "warn",
            other => other,
        }
    }
}

fn max_contig_in_range(s: &str) -> Result<i64> {
    let max: i64 = s
        .parse()
        .context("Could not parse value passed to --max-contig-length to integer")?;
    if max < 0 {
        bail!("--max-contig-length must not be negative");
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::parse_from(["pretext_to_asm", "-a", "in.fa", "-p", "map.agp"]);
        assert_eq!(PathBuf::from("in.fa"), cli.assembly);
        assert_eq!(PathBuf::from("map.agp"), cli.pretext);
        assert_eq!("SUPER_", cli.autosome_prefix);
        assert!(cli.clobber());
        assert!(cli.write_log());
        assert_eq!(Some(2_000_000_000), cli.max_contig_length());
        assert_eq!("info", cli.log_filter());
    }

    #[test]
    fn negative_flags() {
        let cli = Cli::parse_from([
            "pretext_to_asm",
            "-a",
            "in.fa",
            "-p",
            "map.agp",
            "--no-clobber",
            "-W",
            "--max-contig-length",
            "0",
            "--log-level",
            "warning",
        ]);
        assert!(!cli.clobber());
        assert!(!cli.write_log());
        assert_eq!(None, cli.max_contig_length());
        assert_eq!("warn", cli.log_filter());
    }

    #[test]
    fn rejects_missing_required_arguments() {
        assert!(Cli::try_parse_from(["pretext_to_asm", "-a", "in.fa"]).is_err());
    }
}
