//! # Assembly file I/O
//!
//! Format detection plus the AGP and TPF parsers and emitters. FASTA input
//! goes through [`crate::fasta::FastaIndex`], which builds an AGP view of
//! the sequence alongside its index.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};

use crate::assembly::Assembly;
use crate::fasta::FastaIndex;

pub mod agp;
pub mod report;
pub mod tpf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyFormat {
    Agp,
    Tpf,
    Fasta,
}

/// Determine an assembly file's format from its extension.
pub fn format_from_file_extn(path: &Path) -> Option<AssemblyFormat> {
    let extn = path.extension()?.to_str()?.to_lowercase();
    match extn.as_str() {
        "agp" => Some(AssemblyFormat::Agp),
        "tpf" => Some(AssemblyFormat::Tpf),
        "fa" | "fasta" | "fna" => Some(AssemblyFormat::Fasta),
        _ => None,
    }
}

/// Parse an assembly file of any supported format. FASTA files are indexed
/// (writing `.fai` and `.agp` files alongside, reused when current), and
/// the index is returned for sequence retrieval at output time.
pub fn parse_assembly_file(
    path: &Path,
    default_format: AssemblyFormat,
) -> Result<(Assembly, Option<FastaIndex>)> {
    let fmt = format_from_file_extn(path).unwrap_or(default_format);
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("assembly")
        .to_string();

    let open = || -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(path).with_context(|| {
            format!("Could not open assembly file '{}'", path.display())
        })?))
    };

    match fmt {
        AssemblyFormat::Agp => Ok((agp::parse_agp(open()?, &name)?, None)),
        AssemblyFormat::Tpf => Ok((tpf::parse_tpf(open()?, &name)?, None)),
        AssemblyFormat::Fasta => {
            let mut fai = FastaIndex::new(path)?;
            fai.auto_load()?;
            let asm = fai.take_assembly()?;
            Ok((asm, Some(fai)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection() {
        assert_eq!(
            Some(AssemblyFormat::Agp),
            format_from_file_extn(Path::new("xx/aaa.agp"))
        );
        assert_eq!(
            Some(AssemblyFormat::Fasta),
            format_from_file_extn(Path::new("aaa.2.FA"))
        );
        assert_eq!(
            Some(AssemblyFormat::Tpf),
            format_from_file_extn(Path::new("aaa.tpf"))
        );
        assert_eq!(None, format_from_file_extn(Path::new("aaa.txt")));
        assert_eq!(None, format_from_file_extn(Path::new("aaa")));
    }
}
