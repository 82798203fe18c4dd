//! # FASTA indexing and streaming
//!
//! Input FASTA files are scanned once to build a samtools-style `.fai`
//! index plus an AGP view of each sequence's runs of called bases and gaps.
//! Output assemblies are streamed back out in bounded-memory chunks using
//! the index for random access.
pub mod index;
pub mod sequence;
pub mod stream;

pub use index::{FastaIndex, FastaInfo};
pub use stream::FastaStream;
