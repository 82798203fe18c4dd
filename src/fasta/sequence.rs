//! IUPAC ambiguity-aware complementing and a simple in-memory FASTA
//! record, used when whole sequences are small enough to hold.
use std::io::Write;

use anyhow::Result;

const fn build_complement() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u8;
        i += 1;
    }
    let pairs: &[(u8, u8)] = &[
        (b'A', b'T'),
        (b'C', b'G'),
        (b'R', b'Y'),
        (b'M', b'K'),
        (b'B', b'V'),
        (b'D', b'H'),
    ];
    let mut p = 0;
    while p < pairs.len() {
        let (a, b) = pairs[p];
        table[a as usize] = b;
        table[b as usize] = a;
        let (la, lb) = (a + 32, b + 32);
        table[la as usize] = lb;
        table[lb as usize] = la;
        p += 1;
    }
    // S, W and N are their own complements
    table
}

static IUPAC_COMPLEMENT: [u8; 256] = build_complement();

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| IUPAC_COMPLEMENT[b as usize])
        .collect()
}

pub struct FastaSeq {
    pub name: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
}

impl FastaSeq {
    pub fn new(name: impl Into<String>, sequence: Vec<u8>) -> FastaSeq {
        FastaSeq {
            name: name.into(),
            description: None,
            sequence,
        }
    }

    pub fn length(&self) -> usize {
        self.sequence.len()
    }

    pub fn rev_comp(&self) -> FastaSeq {
        FastaSeq {
            name: self.name.clone(),
            description: self.description.clone(),
            sequence: reverse_complement(&self.sequence),
        }
    }

    pub fn write_fasta(&self, out: &mut impl Write, line_length: usize) -> Result<()> {
        write!(out, ">{}", self.name)?;
        if let Some(desc) = &self.description {
            write!(out, " {desc}")?;
        }
        writeln!(out)?;
        for chunk in self.sequence.chunks(line_length) {
            out.write_all(chunk)?;
            writeln!(out)?;
        }
        Ok(())
    }
}
