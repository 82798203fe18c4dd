//! # AGP parsing and formatting
//!
//! The curated map from PretextView arrives as AGP 2.1, with curator tags
//! carried in the columns after the strand. Header `#` lines are kept (one
//! of them holds the Hi-C map resolution); `##` lines are dropped.
use std::io::{BufRead, Write};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::assembly::Assembly;
use crate::fragment::Fragment;
use crate::gap::Gap;
use crate::scaffold::{Row, Scaffold};

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Skips blank header lines while capturing their text
    RE.get_or_init(|| Regex::new(r"^[#\s]+(\S.*)").unwrap())
}

pub fn parse_agp(file: impl BufRead, name: &str) -> Result<Assembly> {
    let mut asm = Assembly::new(name);
    let mut scaffold_name = String::new();

    for line in file.lines() {
        let line = line.context("Reading AGP line")?;
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with("##") {
            continue;
        }
        if line.starts_with('#') {
            if let Some(h) = header_re().captures(&line) {
                asm.add_header_line(&h[1]);
            }
            continue;
        }

        // AGP from Pretext has a stray tab on the end of its lines, which
        // trimming the end removes
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() < 6 {
            bail!("Too few fields ({}) in AGP line: '{line}'", fields.len());
        }

        if fields[0] != scaffold_name {
            scaffold_name = fields[0].to_string();
            asm.add_scaffold(Scaffold::new(&scaffold_name));
        }
        let scaffold = asm.scaffolds.last_mut().unwrap();

        if matches!(fields[4], "U" | "N") {
            if fields.len() < 7 {
                bail!("Too few fields for gap in AGP line: '{line}'");
            }
            let length = fields[5]
                .parse()
                .with_context(|| format!("Bad gap length in AGP line: '{line}'"))?;
            scaffold.add_row(Row::Gap(Gap::new(length, fields[6])));
        } else {
            if fields.len() < 9 {
                bail!("Too few fields for fragment in AGP line: '{line}'");
            }
            let start = fields[6]
                .parse()
                .with_context(|| format!("Bad start in AGP line: '{line}'"))?;
            let end = fields[7]
                .parse()
                .with_context(|| format!("Bad end in AGP line: '{line}'"))?;
            let strand = match fields[8] {
                "+" => 1,
                "-" => -1,
                "?" | "." => 0,
                other => bail!("Bad strand '{other}' in AGP line: '{line}'"),
            };
            // Tenth field onwards are tags metadata
            let tags = fields[9..].iter().map(|t| t.to_string()).collect();
            scaffold.add_row(Row::Fragment(
                Fragment::with_tags(fields[5], start, end, strand, tags)
                    .with_context(|| format!("Bad fragment in AGP line: '{line}'"))?,
            ));
        }
    }

    Ok(asm)
}

pub fn format_agp(asm: &Assembly, file: &mut impl Write) -> Result<()> {
    for line in &asm.header {
        writeln!(file, "# {line}")?;
    }
    for scffld in &asm.scaffolds {
        let mut p = 0;
        for (i, row) in scffld.rows.iter().enumerate() {
            write!(
                file,
                "{}\t{}\t{}\t{}",
                scffld.name,
                p + 1,
                p + row.length(),
                i + 1
            )?;
            p += row.length();
            match row {
                Row::Gap(gap) => {
                    writeln!(
                        file,
                        "\tU\t{}\t{}\tyes\tproximity_ligation",
                        gap.length(),
                        gap.gap_type()
                    )?;
                }
                Row::Fragment(frag) => {
                    let strand = match frag.strand() {
                        1 => '+',
                        -1 => '-',
                        _ => '?',
                    };
                    write!(
                        file,
                        "\tW\t{}\t{}\t{}\t{}",
                        frag.name(),
                        frag.start(),
                        frag.end(),
                        strand
                    )?;
                    for tag in frag.tags() {
                        write!(file, "\t{tag}")?;
                    }
                    writeln!(file)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EXAMPLE_AGP: &str = "\
##agp-version 2.1
#
# DESCRIPTION: Generated by PretextView Version 0.2.5
# HiC MAP RESOLUTION: 8666.611572 bp/texel

Scaffold_1\t1\t21337197\t1\tW\tscaffold_1\t1\t21337197\t+\tPainted
Scaffold_1\t21337198\t21337297\t2\tU\t100\tscaffold\tyes\tproximity_ligation
Scaffold_1\t21337298\t21917959\t3\tW\tscaffold_21\t1\t580662\t+
Scaffold_1\t21917960\t21918059\t4\tU\t100\tscaffold\tyes\tproximity_ligation
Scaffold_1\t21918060\t24379376\t5\tW\tscaffold_1\t21770529\t24231845\t-\tPainted
Scaffold_2\t1\t3206646\t1\tW\tscaffold_2\t1\t3206646\t+\tPainted
Scaffold_2\t3206647\t3206746\t2\tU\t100\tscaffold\tyes\tproximity_ligation
Scaffold_2\t3206747\t3267412\t3\tW\tscaffold_67\t1\t60666\t+\tPainted\tX
Scaffold_2\t3267413\t3267512\t4\tU\t100\tscaffold\tyes\tproximity_ligation
Scaffold_2\t3267513\t28348686\t5\tW\tscaffold_2\t3206647\t28287820\t?\tPainted
";

    #[test]
    fn parse_example() {
        let asm = parse_agp(Cursor::new(EXAMPLE_AGP), "aaBbbCccc1").unwrap();
        assert_eq!("aaBbbCccc1", asm.name);
        assert_eq!(2, asm.header.len());
        assert_eq!(Some(8666.611572), asm.bp_per_texel());
        assert_eq!(2, asm.scaffolds.len());

        let s1 = &asm.scaffolds[0];
        assert_eq!("Scaffold_1", s1.name);
        assert_eq!(5, s1.rows.len());
        assert_eq!(24_379_376, s1.length());
        let last = s1.rows[4].as_fragment().unwrap();
        assert_eq!(-1, last.strand());
        assert_eq!(&["Painted".to_string()], last.tags());

        let s2 = &asm.scaffolds[1];
        let tagged = s2.rows[2].as_fragment().unwrap();
        assert_eq!(
            &["Painted".to_string(), "X".to_string()],
            tagged.tags()
        );
        assert_eq!(0, s2.rows[4].as_fragment().unwrap().strand());
    }

    #[test]
    fn parse_tolerates_trailing_tab() {
        let asm = parse_agp(
            Cursor::new("S1\t1\t100\t1\tW\tfrag_1\t1\t100\t+\t\n"),
            "trailing",
        )
        .unwrap();
        let frag = asm.scaffolds[0].rows[0].as_fragment().unwrap();
        assert_eq!("frag_1", frag.name());
        assert!(frag.tags().is_empty());
    }

    #[test]
    fn parse_rejects_bad_lines() {
        assert!(parse_agp(Cursor::new("S1\t1\t100\n"), "short").is_err());
        assert!(
            parse_agp(Cursor::new("S1\t1\t100\t1\tW\tf\t1\t100\tx\n"), "strand").is_err()
        );
        assert!(
            parse_agp(Cursor::new("S1\t1\t100\t1\tW\tf\t200\t100\t+\n"), "coords").is_err()
        );
    }

    #[test]
    fn round_trip() {
        let asm = parse_agp(Cursor::new(EXAMPLE_AGP), "round_trip").unwrap();
        let mut out = Vec::new();
        format_agp(&asm, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let asm2 = parse_agp(Cursor::new(text.as_str()), "round_trip").unwrap();
        assert_eq!(asm.header, asm2.header);
        assert_eq!(asm.scaffolds.len(), asm2.scaffolds.len());
        for (s1, s2) in asm.scaffolds.iter().zip(&asm2.scaffolds) {
            assert_eq!(s1.name, s2.name);
            assert_eq!(s1.rows, s2.rows);
        }

        // Formatting again yields identical text
        let mut out2 = Vec::new();
        format_agp(&asm2, &mut out2).unwrap();
        assert_eq!(text, String::from_utf8(out2).unwrap());
    }
}
