//! # TPF parsing and formatting
//!
//! Tiling path files describe the input assembly: one fragment or gap per
//! line, with fragment coordinates embedded in the `name:start-end` field.
use std::io::{BufRead, Write};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::assembly::Assembly;
use crate::fragment::Fragment;
use crate::gap::Gap;
use crate::scaffold::{Row, Scaffold};

fn fragment_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+):(\d+)-(\d+)$").unwrap())
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[#\s]+(\S.*)").unwrap())
}

/// `TYPE-2` and `TYPE-3` gaps carry their standard meanings; any other
/// type is lowercased with dashes turned to underscores.
fn decode_gap_type(raw: &str) -> String {
    match raw {
        "TYPE-2" => "scaffold".to_string(),
        "TYPE-3" => "contig".to_string(),
        other => other.to_lowercase().replace('-', "_"),
    }
}

fn encode_gap_type(gap_type: &str) -> String {
    match gap_type {
        "scaffold" => "TYPE-2".to_string(),
        "contig" => "TYPE-3".to_string(),
        other => other.to_uppercase().replace('_', "-"),
    }
}

pub fn parse_tpf(file: impl BufRead, name: &str) -> Result<Assembly> {
    let mut asm = Assembly::new(name);
    let mut scaffold_name = String::new();
    let mut have_scaffold = false;

    for line in file.lines() {
        let line = line.context("Reading TPF line")?;
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if let Some(h) = header_re().captures(&line) {
                asm.add_header_line(&h[1]);
            }
            continue;
        }

        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();

        if fields[0] == "GAP" {
            if !have_scaffold {
                bail!("Gap line before first sequence fragment: '{line}'");
            }
            if fields.len() < 3 {
                bail!("Wrong field count {}; 3 expected in line: '{line}'", fields.len());
            }
            let length = fields[2]
                .parse()
                .with_context(|| format!("Bad gap length in line: '{line}'"))?;
            asm.scaffolds
                .last_mut()
                .unwrap()
                .add_row(Row::Gap(Gap::new(length, decode_gap_type(fields[1]))));
        } else if fields.len() == 4 {
            if fields[2] != scaffold_name {
                scaffold_name = fields[2].to_string();
                asm.add_scaffold(Scaffold::new(&scaffold_name));
                have_scaffold = true;
            }
            let Some(m) = fragment_name_re().captures(fields[1]) else {
                bail!("Unexpected name format '{}'", fields[1]);
            };
            let start = m[2].parse().with_context(|| format!("Bad start: '{line}'"))?;
            let end = m[3].parse().with_context(|| format!("Bad end: '{line}'"))?;
            let strand = match fields[3] {
                "PLUS" => 1,
                "MINUS" => -1,
                other => bail!("Bad strand '{other}' in line: '{line}'"),
            };
            asm.scaffolds.last_mut().unwrap().add_row(Row::Fragment(
                Fragment::new(&m[1], start, end, strand)
                    .with_context(|| format!("Bad fragment in line: '{line}'"))?,
            ));
        } else {
            bail!("Wrong field count {}; 4 expected in line: '{line}'", fields.len());
        }
    }

    Ok(asm)
}

pub fn format_tpf(asm: &Assembly, file: &mut impl Write) -> Result<()> {
    for line in &asm.header {
        writeln!(file, "## {line}")?;
    }
    for scffld in &asm.scaffolds {
        for row in &scffld.rows {
            match row {
                Row::Gap(gap) => {
                    writeln!(
                        file,
                        "GAP\t{}\t{}",
                        encode_gap_type(gap.gap_type()),
                        gap.length()
                    )?;
                }
                Row::Fragment(frag) => {
                    let strand = match frag.strand() {
                        1 => "PLUS",
                        -1 => "MINUS",
                        _ => "UNKNOWN",
                    };
                    writeln!(
                        file,
                        "?\t{}:{}-{}\t{}\t{}",
                        frag.name(),
                        frag.start(),
                        frag.end(),
                        scffld.name,
                        strand
                    )?;
                }
            }
        }
    }
    Ok(())
}
