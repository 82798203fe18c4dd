//! # Output files
//!
//! Names the output assemblies from the `--output` template and writes
//! them, with their companion AGP, CSV and YAML files. Which files appear
//! depends on the haplotype structure of the curated map: a lone curated
//! haplotype gives a `primary` assembly, a `Primary`-tagged map adds an
//! `all_haplotigs` assembly holding the other haplotypes, and a fully
//! curated multi-haplotype map gets one `primary` file per haplotype.
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use regex::Regex;

use crate::assembly::Assembly;
use crate::build::AsmKey;
use crate::fasta::{FastaIndex, FastaStream};
use crate::io::report::{chr_report_csv, chromosome_list_csv, info_yaml};
use crate::io::{agp, tpf, AssemblyFormat};
use crate::stats::AssemblyStats;

/// An output file already exists and `--no-clobber` is in force.
#[derive(Debug)]
pub struct OutputExistsError(pub PathBuf);

impl fmt::Display for OutputExistsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output file '{}' already exists", self.0.display())
    }
}

impl std::error::Error for OutputExistsError {}

#[derive(Debug, Clone)]
pub struct OutputTemplate {
    pub format: AssemblyFormat,
    pub dir: PathBuf,
    pub root: String,
    pub version: String,
    pub suffix: String,
}

/// Split an output path such as `xx/mVulVul1.2.fa` into its directory,
/// name root, assembly version (default "1") and format.
pub fn parse_output_file(file: &Path) -> Result<OutputTemplate> {
    let Some(format) = crate::io::format_from_file_extn(file) else {
        bail!("Unknown output file format '{}'", file.display());
    };
    let suffix = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut root = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    static VERSION_RE: OnceLock<Regex> = OnceLock::new();
    let re = VERSION_RE.get_or_init(|| Regex::new(r"\.(\d+)$").unwrap());
    let version = match re.captures(&root) {
        Some(m) => {
            let v = m[1].to_string();
            root.truncate(root.len() - v.len() - 1);
            v
        }
        None => "1".to_string(),
    };

    Ok(OutputTemplate {
        format,
        dir: file.parent().unwrap_or(Path::new("")).to_path_buf(),
        root,
        version,
        suffix,
    })
}

/// Rename the built assemblies for their output files.
pub fn name_assemblies(
    asm_dict: IndexMap<AsmKey, Assembly>,
    root: &str,
    version: &str,
) -> IndexMap<AsmKey, Assembly> {
    let mut ret_asm: IndexMap<AsmKey, Assembly> = IndexMap::new();

    if asm_dict.contains_key(&Some("Primary".to_string())) {
        // A combined map of two or more haplotypes where only one has been
        // curated: the other haplotypes merge into an "all_haplotigs" file
        let mut other_asm: Vec<Assembly> = Vec::new();
        for (asm_key, mut asm) in asm_dict {
            if asm_key.as_deref() == Some("Primary") {
                asm.name = format!("{root}.{version}.primary");
            } else if asm.curated {
                other_asm.push(asm);
                continue;
            } else if let Some(key) = &asm_key {
                asm.name = format!("{root}.{version}.{}s", key.to_lowercase());
            }
            ret_asm.insert(asm_key, asm);
        }
        if !other_asm.is_empty() {
            let mut htigs = merge_assemblies(other_asm);
            htigs.curated = true;
            htigs.name = format!("{root}.{version}.all_haplotigs");
            ret_asm.insert(Some("all_haplotigs".to_string()), htigs);
        }
    } else if asm_dict.contains_key(&None) {
        // A single haplotype map
        for (asm_key, mut asm) in asm_dict {
            if asm_key.is_none() {
                asm.name = format!("{root}.{version}.primary");
                ret_asm.insert(None, asm);
            } else if asm_key.as_deref() == Some("Haplotig") {
                asm.name = format!("{root}.{version}.additional_haplotigs");
                asm.curated = true;
                ret_asm.insert(Some("additional_haplotigs".to_string()), asm);
            } else {
                let key = asm_key.as_deref().unwrap_or_default().to_lowercase();
                asm.name = format!("{root}.{version}.{key}s");
                ret_asm.insert(asm_key, asm);
            }
        }
    } else {
        // Two or more curated haplotypes in a combined map
        for (asm_key, mut asm) in asm_dict {
            let key = asm_key.clone().unwrap_or_default();
            if asm.curated {
                asm.name = format!("{root}.{}.{version}.primary", key.to_lowercase());
            } else {
                asm.name = format!("{root}.{version}.{}s", key.to_lowercase());
            }
            ret_asm.insert(asm_key, asm);
        }
    }

    ret_asm
}

fn merge_assemblies(asm_list: Vec<Assembly>) -> Assembly {
    let mut new = Assembly::new("merge");
    for asm in asm_list {
        for scffld in asm.scaffolds {
            new.add_scaffold(scffld);
        }
    }
    new
}

/// Open an output file, refusing to overwrite unless clobbering is on, and
/// report the file to the user on stderr.
pub fn create_output_file(path: &Path, clobber: bool) -> Result<File> {
    let existed = path.exists();
    if existed && !clobber {
        return Err(OutputExistsError(path.to_path_buf()).into());
    }
    let file = File::create(path)
        .with_context(|| format!("Could not create output file '{}'", path.display()))?;
    let op = if existed { "Overwrote" } else { "Created" };
    eprintln!("{op:>11}: '{}'", path.display());
    Ok(file)
}

pub fn write_assemblies(
    fai: Option<&FastaIndex>,
    template: &OutputTemplate,
    out_assemblies: &IndexMap<AsmKey, Assembly>,
    clobber: bool,
) -> Result<()> {
    for asm in out_assemblies.values() {
        let crtd = if asm.curated { ".curated" } else { "" };
        let output_file = template
            .dir
            .join(format!("{}{crtd}{}", asm.name, template.suffix));
        write_assembly(fai, asm, &output_file, template.format, clobber)?;
    }
    Ok(())
}

pub fn write_assembly(
    fai: Option<&FastaIndex>,
    out_asm: &Assembly,
    output_file: &Path,
    format: AssemblyFormat,
    clobber: bool,
) -> Result<()> {
    let mut out_fh = create_output_file(output_file, clobber)?;
    match format {
        AssemblyFormat::Tpf => tpf::format_tpf(out_asm, &mut out_fh)?,
        AssemblyFormat::Agp => agp::format_agp(out_asm, &mut out_fh)?,
        AssemblyFormat::Fasta => {
            let Some(fai) = fai else {
                bail!("Cannot write FASTA output file without FASTA input!");
            };
            let mut stream = FastaStream::new(&mut out_fh, fai)?;
            stream.write_assembly(out_asm)?;

            // Save a .agp file alongside the .fa / .fasta
            let output_agp = output_file.with_extension("agp");
            let mut agp_fh = create_output_file(&output_agp, clobber)?;
            agp::format_agp(out_asm, &mut agp_fh)?;
        }
    }
    out_fh.flush()?;
    Ok(())
}

pub fn write_chr_csv_files(
    out_dir: &Path,
    out_assemblies: &IndexMap<AsmKey, Assembly>,
    clobber: bool,
) -> Result<()> {
    for asm in out_assemblies.values() {
        if !asm.curated {
            continue;
        }
        if let Some(chr_names) = chromosome_list_csv(asm)? {
            let csv_file = out_dir.join(format!("{}.chromosome.list.csv", asm.name));
            let mut csv_fh = create_output_file(&csv_file, clobber)?;
            csv_fh.write_all(chr_names.as_bytes())?;
        }
    }
    Ok(())
}

pub fn write_chr_report_csv(
    output_file: &Path,
    out_assemblies: &IndexMap<AsmKey, Assembly>,
    clobber: bool,
) -> Result<()> {
    let Some(csv) = chr_report_csv(out_assemblies)? else {
        return Ok(());
    };
    let csv_file = output_file.with_extension("chr_report.csv");
    let mut csv_fh = create_output_file(&csv_file, clobber)?;
    csv_fh.write_all(csv.as_bytes())?;
    Ok(())
}

pub fn write_info_yaml(
    output_file: &Path,
    out_assemblies: &IndexMap<AsmKey, Assembly>,
    stats: &AssemblyStats,
    clobber: bool,
) -> Result<()> {
    let yaml = info_yaml(out_assemblies, stats)?;
    let yaml_file = output_file.with_extension("info.yaml");
    let mut yaml_fh = create_output_file(&yaml_file, clobber)?;
    yaml_fh.write_all(yaml.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(path: &str) -> (AssemblyFormat, PathBuf, String, String, String) {
        let t = parse_output_file(Path::new(path)).unwrap();
        (t.format, t.dir, t.root, t.version, t.suffix)
    }

    #[test]
    fn output_file_templates() {
        assert_eq!(
            (
                AssemblyFormat::Fasta,
                PathBuf::from("xx"),
                "aaa".to_string(),
                "2".to_string(),
                ".fa".to_string()
            ),
            template("xx/aaa.2.fa")
        );
        assert_eq!(
            (
                AssemblyFormat::Fasta,
                PathBuf::from("xx"),
                "aaa".to_string(),
                "1".to_string(),
                ".fasta".to_string()
            ),
            template("xx/aaa.fasta")
        );
        assert_eq!(
            (
                AssemblyFormat::Agp,
                PathBuf::from("xx"),
                "aaa".to_string(),
                "1".to_string(),
                ".agp".to_string()
            ),
            template("xx/aaa.agp")
        );
        assert!(parse_output_file(Path::new("aaa.txt")).is_err());
    }

    fn bucket(key: AsmKey, curated: bool) -> (AsmKey, Assembly) {
        let mut asm = Assembly::new("build");
        asm.curated = curated;
        (key, asm)
    }

    #[test]
    fn single_haplotype_names() {
        let dict: IndexMap<AsmKey, Assembly> = [
            bucket(None, true),
            bucket(Some("Haplotig".to_string()), false),
            bucket(Some("Contaminant".to_string()), false),
        ]
        .into_iter()
        .collect();
        let named = name_assemblies(dict, "mVulVul1", "2");
        assert_eq!("mVulVul1.2.primary", named[&None].name);
        let htigs = &named[&Some("additional_haplotigs".to_string())];
        assert_eq!("mVulVul1.2.additional_haplotigs", htigs.name);
        assert!(htigs.curated);
        assert_eq!(
            "mVulVul1.2.contaminants",
            named[&Some("Contaminant".to_string())].name
        );
    }

    #[test]
    fn primary_tagged_names() {
        let dict: IndexMap<AsmKey, Assembly> = [
            bucket(Some("Primary".to_string()), true),
            bucket(Some("Hap2".to_string()), true),
            bucket(Some("Haplotig".to_string()), false),
        ]
        .into_iter()
        .collect();
        let named = name_assemblies(dict, "root", "1");
        assert_eq!(
            "root.1.primary",
            named[&Some("Primary".to_string())].name
        );
        let merged = &named[&Some("all_haplotigs".to_string())];
        assert_eq!("root.1.all_haplotigs", merged.name);
        assert!(merged.curated);
        assert!(!named.contains_key(&Some("Hap2".to_string())));
        assert_eq!(
            "root.1.haplotigs",
            named[&Some("Haplotig".to_string())].name
        );
    }

    #[test]
    fn multi_haplotype_names() {
        let dict: IndexMap<AsmKey, Assembly> = [
            bucket(Some("Hap1".to_string()), true),
            bucket(Some("Hap2".to_string()), true),
            bucket(Some("Contaminant".to_string()), false),
        ]
        .into_iter()
        .collect();
        let named = name_assemblies(dict, "root", "1");
        assert_eq!(
            "root.hap1.1.primary",
            named[&Some("Hap1".to_string())].name
        );
        assert_eq!(
            "root.hap2.1.primary",
            named[&Some("Hap2".to_string())].name
        );
        assert_eq!(
            "root.1.contaminants",
            named[&Some("Contaminant".to_string())].name
        );
    }

    #[test]
    fn clobber_guard() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.agp");
        create_output_file(&path, false).unwrap();
        let err = create_output_file(&path, false).unwrap_err();
        assert!(err.downcast_ref::<OutputExistsError>().is_some());
        create_output_file(&path, true).unwrap();
    }
}
