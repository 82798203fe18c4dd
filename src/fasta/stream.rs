//! # FastaStream
//!
//! Streams an assembly out as FASTA, fetching fragment sequence through the
//! index in bounded chunks and writing gaps as runs of `N`. Reverse strand
//! fragments are reverse-complemented chunk by chunk, walking the chunks
//! backwards so nothing larger than the buffer is ever held.
use std::fs::File;
use std::io::Write;

use anyhow::Result;

use crate::assembly::Assembly;
use crate::fasta::index::FastaIndex;
use crate::fasta::sequence::reverse_complement;
use crate::fragment::Fragment;
use crate::gap::Gap;
use crate::scaffold::{Row, Scaffold};

pub const DEFAULT_LINE_LENGTH: usize = 60;

pub struct FastaStream<'a, W: Write> {
    out: W,
    index: &'a FastaIndex,
    fasta: File,
    line_length: usize,
    gap_character: u8,
    column: usize,
}

impl<'a, W: Write> FastaStream<'a, W> {
    pub fn new(out: W, index: &'a FastaIndex) -> Result<FastaStream<'a, W>> {
        Ok(FastaStream {
            out,
            index,
            fasta: index.open_fasta()?,
            line_length: DEFAULT_LINE_LENGTH,
            gap_character: b'N',
            column: 0,
        })
    }

    pub fn write_assembly(&mut self, assembly: &Assembly) -> Result<()> {
        for scffld in &assembly.scaffolds {
            self.write_scaffold(scffld)?;
        }
        Ok(())
    }

    pub fn write_scaffold(&mut self, scaffold: &Scaffold) -> Result<()> {
        writeln!(self.out, ">{}", scaffold.name)?;
        self.column = 0;
        for row in &scaffold.rows {
            match row {
                Row::Gap(gap) => self.write_gap(gap)?,
                Row::Fragment(frag) => self.write_fragment(frag)?,
            }
        }
        if self.column != 0 {
            writeln!(self.out)?;
            self.column = 0;
        }
        Ok(())
    }

    fn write_fragment(&mut self, frag: &Fragment) -> Result<()> {
        let info = self.index.get_info(frag.name())?.clone();
        let ranges = self.index.chunk_ranges(frag.start(), frag.end());
        if frag.strand() == -1 {
            for &(start, end) in ranges.iter().rev() {
                let chunk = self
                    .index
                    .sequence_bytes(&mut self.fasta, &info, start, end)?;
                self.write_seq(&reverse_complement(&chunk))?;
            }
        } else {
            for &(start, end) in &ranges {
                let chunk = self
                    .index
                    .sequence_bytes(&mut self.fasta, &info, start, end)?;
                self.write_seq(&chunk)?;
            }
        }
        Ok(())
    }

    fn write_gap(&mut self, gap: &Gap) -> Result<()> {
        let mut remaining = gap.length() as usize;
        let chunk = vec![self.gap_character; remaining.min(self.index.buffer_size())];
        while remaining > 0 {
            let take = remaining.min(chunk.len());
            self.write_seq(&chunk[..take])?;
            remaining -= take;
        }
        Ok(())
    }

    fn write_seq(&mut self, seq: &[u8]) -> Result<()> {
        let mut i = 0;
        while i < seq.len() {
            let want = self.line_length - self.column;
            let take = want.min(seq.len() - i);
            self.out.write_all(&seq[i..i + take])?;
            self.column += take;
            i += take;
            if self.column == self.line_length {
                writeln!(self.out)?;
                self.column = 0;
            }
        }
        Ok(())
    }
}
