//! # FastaIndex
//!
//! Scans a FASTA file once, recording for each sequence its samtools-style
//! index entry (length, file offset, residues per line, bytes per line)
//! and the runs of called bases, so the sequence becomes an AGP scaffold
//! of fragments separated by gaps. Any character outside `ACGTacgt` is
//! treated as gap. The `.fai` and `.agp` sidecar files are written next to
//! the FASTA and reused on later runs when they are newer than it.
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use log::warn;
use regex::bytes::Regex;

use crate::assembly::Assembly;
use crate::fragment::Fragment;
use crate::gap::Gap;
use crate::io::agp::{format_agp, parse_agp};
use crate::scaffold::{Row, Scaffold};

pub const DEFAULT_BUFFER_SIZE: usize = 250_000;

/// One row of a `.fai` index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaInfo {
    pub length: i64,
    pub file_offset: u64,
    pub residues_per_line: i64,
    pub max_line_length: i64,
}

impl FastaInfo {
    fn fai_row(&self, name: &str) -> String {
        format!(
            "{name}\t{}\t{}\t{}\t{}\n",
            self.length, self.file_offset, self.residues_per_line, self.max_line_length
        )
    }
}

pub struct FastaIndex {
    fasta_file: PathBuf,
    buffer_size: usize,
    fai_file: PathBuf,
    agp_file: PathBuf,
    index: IndexMap<String, FastaInfo>,
    assembly: Option<Assembly>,
}

impl FastaIndex {
    pub fn new(fasta_file: &Path) -> Result<FastaIndex> {
        FastaIndex::with_buffer_size(fasta_file, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(fasta_file: &Path, buffer_size: usize) -> Result<FastaIndex> {
        if !fasta_file.exists() {
            bail!("No such FASTA file '{}'", fasta_file.display());
        }
        let mut fai_file = fasta_file.as_os_str().to_owned();
        fai_file.push(".fai");
        let mut agp_file = fasta_file.as_os_str().to_owned();
        agp_file.push(".agp");
        Ok(FastaIndex {
            fasta_file: fasta_file.to_path_buf(),
            buffer_size,
            fai_file: PathBuf::from(fai_file),
            agp_file: PathBuf::from(agp_file),
            index: IndexMap::new(),
            assembly: None,
        })
    }

    pub fn fasta_file(&self) -> &Path {
        &self.fasta_file
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Load the `.fai` and `.agp` sidecar files if both are current, else
    /// index the FASTA and (re)write them.
    pub fn auto_load(&mut self) -> Result<()> {
        if self.sidecar_files_are_current()? {
            self.load_index()?;
            self.load_assembly()?;
        } else {
            self.run_indexing()?;
        }
        Ok(())
    }

    /// Hand over the AGP view of the FASTA, leaving the index for
    /// sequence retrieval.
    pub fn take_assembly(&mut self) -> Result<Assembly> {
        self.assembly
            .take()
            .context("FASTA index has not been loaded")
    }

    fn sidecar_files_are_current(&self) -> Result<bool> {
        let fasta_mtime = mtime(&self.fasta_file)?;
        for idx_file in [&self.fai_file, &self.agp_file] {
            if !idx_file.exists() {
                return Ok(false);
            }
            if mtime(idx_file)? <= fasta_mtime {
                warn!(
                    "Index file '{}' is older than FASTA file '{}'",
                    idx_file.display(),
                    self.fasta_file.display()
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn load_index(&mut self) -> Result<()> {
        let reader = BufReader::new(File::open(&self.fai_file)?);
        for line in reader.lines() {
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 5 {
                bail!("Bad FAI line: '{line}'");
            }
            self.index.insert(
                fields[0].to_string(),
                FastaInfo {
                    length: fields[1].parse()?,
                    file_offset: fields[2].parse()?,
                    residues_per_line: fields[3].parse()?,
                    max_line_length: fields[4].parse()?,
                },
            );
        }
        Ok(())
    }

    fn write_index(&self) -> Result<()> {
        if self.fai_file.exists() {
            warn!("Overwriting FAI index file '{}'", self.fai_file.display());
        }
        let mut out = File::create(&self.fai_file)?;
        for (name, info) in &self.index {
            out.write_all(info.fai_row(name).as_bytes())?;
        }
        Ok(())
    }

    fn load_assembly(&mut self) -> Result<()> {
        let reader = BufReader::new(File::open(&self.agp_file)?);
        let name = self
            .fasta_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("assembly");
        self.assembly = Some(parse_agp(reader, name)?);
        Ok(())
    }

    fn write_assembly(&self) -> Result<()> {
        let Some(asm) = &self.assembly else {
            bail!("No assembly data to write to AGP file");
        };
        if self.agp_file.exists() {
            warn!(
                "Overwriting AGP assembly file '{}'",
                self.agp_file.display()
            );
        }
        let mut out = File::create(&self.agp_file)?;
        format_agp(asm, &mut out)
    }

    fn run_indexing(&mut self) -> Result<()> {
        let (index, assembly) = index_fasta_file(&self.fasta_file, self.buffer_size)?;
        self.index = index;
        self.assembly = Some(assembly);
        self.write_index()?;
        self.write_assembly()
    }

    pub fn get_info(&self, name: &str) -> Result<&FastaInfo> {
        self.index
            .get(name)
            .with_context(|| format!("No sequence in index named '{name}'"))
    }

    pub fn open_fasta(&self) -> Result<File> {
        File::open(&self.fasta_file).with_context(|| {
            format!("Could not open FASTA file '{}'", self.fasta_file.display())
        })
    }

    /// Sub-ranges of at most `buffer_size` bases covering `start..=end`,
    /// in left-to-right order.
    pub fn chunk_ranges(&self, start: i64, end: i64) -> Vec<(i64, i64)> {
        let max = self.buffer_size as i64;
        let chunk_count = 1 + (end - start) / max;
        (0..chunk_count)
            .map(|i| {
                let chunk_start = start + i * max;
                (chunk_start, end.min(chunk_start + max - 1))
            })
            .collect()
    }

    /// Read the bases of `start..=end` (1-based, inclusive) of a sequence,
    /// seeking line-wise through the FASTA.
    pub fn sequence_bytes(
        &self,
        fh: &mut File,
        info: &FastaInfo,
        start: i64,
        end: i64,
    ) -> Result<Vec<u8>> {
        let start = start - 1; // zero-based
        let rpl = info.residues_per_line;
        let mll = info.max_line_length;
        let line_end_bytes = mll - rpl;

        let frst_line = start / rpl;
        let last_line = (end - 1) / rpl;
        let frst_offset = start % rpl;
        let last_offset = end % rpl;

        // Seek to the first residue
        fh.seek(SeekFrom::Start(
            info.file_offset + (frst_offset + mll * frst_line) as u64,
        ))?;

        let mut seq = Vec::with_capacity((end - start) as usize);
        if frst_line == last_line {
            // All on one line of the FASTA file
            read_seq(fh, &mut seq, (end - start) as usize)?;
        } else {
            // Sequence to the end of the first line
            read_seq(fh, &mut seq, (rpl - frst_offset) as usize)?;
            fh.seek(SeekFrom::Current(line_end_bytes))?;

            // All the whole lines
            let last_whole_line = if last_offset == 0 {
                last_line
            } else {
                last_line - 1
            };
            for _ in 0..(last_whole_line - frst_line) {
                read_seq(fh, &mut seq, rpl as usize)?;
                fh.seek(SeekFrom::Current(line_end_bytes))?;
            }

            // Any sequence on the last line
            if last_offset > 0 {
                read_seq(fh, &mut seq, last_offset as usize)?;
            }
        }
        Ok(seq)
    }
}

fn read_seq(fh: &mut File, seq: &mut Vec<u8>, count: usize) -> Result<()> {
    let at = seq.len();
    seq.resize(at + count, 0);
    fh.read_exact(&mut seq[at..])
        .context("Unexpected end of FASTA file")?;
    Ok(())
}

fn mtime(path: &Path) -> Result<SystemTime> {
    Ok(path
        .metadata()
        .with_context(|| format!("Could not stat '{}'", path.display()))?
        .modified()?)
}

fn called_bases_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ACGTacgt]+").unwrap())
}

struct SequenceScan {
    name: String,
    file_offset: u64,
    line_end_bytes: i64,
    residues_per_line: i64,
    seq_length: i64,
    region_start: i64,
    region_end: Option<i64>,
    seq_regions: Vec<(i64, i64)>,
    buffer: Vec<u8>,
}

impl SequenceScan {
    /// Find runs of called bases in the buffered sequence, extending the
    /// current region or starting a new one, then empty the buffer.
    fn process_buffer(&mut self) {
        for m in called_bases_re().find_iter(&self.buffer) {
            let start = self.seq_length + m.start() as i64;
            let end = self.seq_length + m.end() as i64;
            if Some(start) == self.region_end {
                self.region_end = Some(end);
            } else {
                if let Some(region_end) = self.region_end {
                    self.seq_regions.push((self.region_start, region_end));
                }
                self.region_start = start;
                self.region_end = Some(end);
            }
        }
        self.seq_length += self.buffer.len() as i64;
        self.buffer.clear();
    }

    /// Build the scaffold of fragments and gaps from the scanned regions.
    fn into_scaffold_and_info(mut self) -> Result<(String, FastaInfo, Scaffold)> {
        self.process_buffer();
        if let Some(region_end) = self.region_end {
            self.seq_regions.push((self.region_start, region_end));
        }

        let info = FastaInfo {
            length: self.seq_length,
            file_offset: self.file_offset,
            residues_per_line: self.residues_per_line,
            max_line_length: self.residues_per_line + self.line_end_bytes,
        };

        let mut scffld = Scaffold::new(&self.name);
        let mut prev_end = 0;
        for (start, end) in &self.seq_regions {
            if *start != prev_end {
                scffld.add_row(Row::Gap(Gap::new(start - prev_end, "scaffold")));
            }
            // Regions are zero-based half-open
            scffld.add_row(Row::Fragment(Fragment::new(&self.name, start + 1, *end, 1)?));
            prev_end = *end;
        }
        if self.seq_length > prev_end {
            scffld.add_row(Row::Gap(Gap::new(self.seq_length - prev_end, "scaffold")));
        }

        Ok((self.name, info, scffld))
    }
}

/// Scan a FASTA file, returning its index and the AGP view of its
/// sequences. Reading proceeds in `buffer_size` chunks so memory use stays
/// bounded for chromosome-sized sequences.
pub fn index_fasta_file(
    file: &Path,
    buffer_size: usize,
) -> Result<(IndexMap<String, FastaInfo>, Assembly)> {
    let mut idx_dict: IndexMap<String, FastaInfo> = IndexMap::new();
    let mut asm = Assembly::new(
        file.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("assembly"),
    );
    asm.add_header_line(format!(
        "Built from FASTA file '{}'",
        file.canonicalize().unwrap_or_else(|_| file.to_path_buf()).display()
    ));

    let fh = File::open(file)
        .with_context(|| format!("Could not open FASTA file '{}'", file.display()))?;
    let mut reader = BufReader::new(fh);
    let mut line: Vec<u8> = Vec::new();
    let mut offset: u64 = 0;
    let mut scan: Option<SequenceScan> = None;

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            break;
        }
        offset += n as u64;

        if line[0] == b'>' {
            // Store the accumulated data from the previous sequence
            if let Some(scan) = scan.take() {
                store_sequence(scan, file, &mut idx_dict, &mut asm)?;
            }

            // The name is the first word after the ">"
            let name = line[1..]
                .split(|b| b.is_ascii_whitespace())
                .find(|w| !w.is_empty())
                .map(|w| String::from_utf8_lossy(w).to_string())
                .unwrap_or_default();
            if name.is_empty() {
                bail!(
                    "Failed to parse sequence name from line: '{}'",
                    String::from_utf8_lossy(&line).trim_end()
                );
            }

            // Each sequence entry is assumed to keep the same line ending
            let line_end_bytes = if line.ends_with(b"\r\n") { 2 } else { 1 };
            scan = Some(SequenceScan {
                name,
                // The first residue is where the file pointer now sits
                file_offset: offset,
                line_end_bytes,
                residues_per_line: 0,
                seq_length: 0,
                region_start: 0,
                region_end: None,
                seq_regions: Vec::new(),
                buffer: Vec::new(),
            });
        } else if let Some(scan) = scan.as_mut() {
            let mut end = line.len();
            while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
                end -= 1;
            }
            if scan.residues_per_line == 0 {
                scan.residues_per_line = end as i64;
            }
            scan.buffer.extend_from_slice(&line[..end]);
            if scan.buffer.len() > buffer_size {
                scan.process_buffer();
            }
        } else {
            bail!("Sequence data before first FASTA header in '{}'", file.display());
        }
    }

    if let Some(scan) = scan.take() {
        store_sequence(scan, file, &mut idx_dict, &mut asm)?;
    }

    if idx_dict.is_empty() {
        bail!("No data in FASTA file '{}'", file.display());
    }
    Ok((idx_dict, asm))
}

fn store_sequence(
    scan: SequenceScan,
    file: &Path,
    idx_dict: &mut IndexMap<String, FastaInfo>,
    asm: &mut Assembly,
) -> Result<()> {
    let (name, info, scffld) = scan.into_scaffold_and_info()?;
    if idx_dict.contains_key(&name) {
        bail!(
            "More than one sequence named '{name}' in FASTA file '{}'",
            file.display()
        );
    }
    idx_dict.insert(name, info);
    asm.add_scaffold(scffld);
    Ok(())
}
