//! # BuildAssembly
//!
//! Re-projects the curated map onto the exact base-pair coordinates of the
//! input assembly: collects overlap results for every bait, resolves
//! fragments pulled into more than one curated scaffold, cuts the genuine
//! breaks, recovers input sequence the curator never placed, fuses the
//! pieces into scaffolds and buckets them into per-haplotype output
//! assemblies.
use anyhow::{bail, Context, Result};
use indexmap::{IndexMap, IndexSet};
use log::{info, warn};

use crate::assembly::Assembly;
use crate::fragment::{Fragment, FragmentKey};
use crate::gap::Gap;
use crate::indexed_assembly::IndexedAssembly;
use crate::naming::{ChrNamer, ScaffoldNamer};
use crate::overlap_result::OverlapResult;
use crate::resolver::{FoundFragment, OverhangResolver};
use crate::scaffold::{Rank, Row, Scaffold, ScaffoldTag};

/// Key of an output assembly: the scaffold tag name for contaminants,
/// haplotigs and false duplicates, else the haplotype, else `None`.
pub type AsmKey = Option<String>;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub autosome_prefix: String,
    pub default_gap: Gap,
    pub max_contig_length: Option<i64>,
    pub allow_consecutive_autosomes: bool,
}

impl Default for BuildOptions {
    fn default() -> BuildOptions {
        BuildOptions {
            autosome_prefix: "SUPER_".to_string(),
            default_gap: Gap::new(200, "scaffold"),
            max_contig_length: Some(2_000_000_000),
            allow_consecutive_autosomes: false,
        }
    }
}

pub struct BuildAssembly {
    name: String,
    options: BuildOptions,
    error_length: i64,
    results: Vec<OverlapResult>,
    extra_scaffolds: Vec<Scaffold>,
    found: IndexMap<FragmentKey, FoundFragment>,
    multi: IndexSet<FragmentKey>,
    namer: ScaffoldNamer,
    cuts: usize,
}

impl BuildAssembly {
    pub fn new(name: impl Into<String>, options: BuildOptions) -> BuildAssembly {
        BuildAssembly {
            name: name.into(),
            options,
            error_length: 0,
            results: Vec::new(),
            extra_scaffolds: Vec::new(),
            found: IndexMap::new(),
            multi: IndexSet::new(),
            namer: ScaffoldNamer::new(),
            cuts: 0,
        }
    }

    /// Number of cut points introduced into input fragments.
    pub fn cuts(&self) -> usize {
        self.cuts
    }

    /// Coordinates from the curated map are quantised to texels, so
    /// anything closer than one texel's worth of bases is rounding noise.
    pub fn error_length(&self) -> i64 {
        self.error_length
    }

    /// Run the coordinate re-projection: overlap collection, overhang
    /// resolution, cutting, size renames and recovery of unplaced input
    /// sequence.
    pub fn remap_to_input_assembly(
        &mut self,
        prtxt_asm: &Assembly,
        input_asm: &IndexedAssembly,
    ) -> Result<()> {
        let Some(bp_per_texel) = prtxt_asm.bp_per_texel() else {
            bail!(
                "No bp/texel map resolution in curated assembly '{}'",
                prtxt_asm.name
            );
        };
        self.error_length = bp_per_texel.floor() as i64 + 1;

        self.find_assembly_overlaps(prtxt_asm, input_asm)?;
        self.discard_overhanging_fragments();
        self.cut_remaining_overhangs()?;
        self.namer.rename_unlocs_by_size(&mut self.results);
        self.namer.rename_haplotigs_by_size(&mut self.results);
        self.add_missing_scaffolds_from_input(input_asm);
        Ok(())
    }

    fn find_assembly_overlaps(
        &mut self,
        prtxt_asm: &Assembly,
        input_asm: &IndexedAssembly,
    ) -> Result<()> {
        for prtxt_scffld in &prtxt_asm.scaffolds {
            self.namer.make_scaffold_name(prtxt_scffld)?;
            let scaffold_tags = prtxt_scffld.fragment_tags();
            for prtxt_frag in prtxt_scffld.fragments() {
                let found = input_asm.find_overlaps(prtxt_frag).with_context(|| {
                    format!("Searching input assembly for bait {prtxt_frag}")
                })?;
                let Some(mut found) = found else {
                    warn!("No overlaps found for: {prtxt_frag}");
                    continue;
                };
                let idx = self.results.len();
                self.namer.label_scaffold(
                    idx,
                    &mut found,
                    prtxt_frag,
                    &scaffold_tags,
                    &prtxt_scffld.name,
                )?;
                found.trim_large_overhangs(self.error_length);
                self.store_fragments_found(idx, &found);
                self.results.push(found);
            }
        }
        Ok(())
    }

    fn store_fragments_found(&mut self, idx: usize, result: &OverlapResult) {
        for ff in result.scaffold.fragments() {
            let key = ff.key();
            if let Some(fnd) = self.found.get_mut(&key) {
                // Already have it, so record that it was found more than
                // once
                self.multi.insert(key);
                fnd.add_result(idx);
            } else {
                let mut fnd = FoundFragment::new(ff.clone());
                fnd.add_result(idx);
                self.found.insert(key, fnd);
            }
        }
    }

    /// Repeatedly resolve shared terminal fragments until a round makes no
    /// fixes. Fragments whose residual occurrence count drops to one leave
    /// the multi table.
    fn discard_overhanging_fragments(&mut self) {
        while !self.multi.is_empty() {
            let mut resolver = OverhangResolver::new();
            for key in &self.multi {
                let fnd = &self.found[key];
                for &ridx in &fnd.results {
                    resolver.add_overhang_premise(&fnd.fragment, ridx, &self.results[ridx]);
                }
            }
            let fixes = resolver.make_fixes(&mut self.results, self.error_length);
            if fixes.is_empty() {
                break;
            }
            for premise in fixes {
                let key = premise.fragment.key();
                if let Some(fnd) = self.found.get_mut(&key) {
                    fnd.remove_result(premise.result);
                    if fnd.result_count() <= 1 {
                        self.multi.shift_remove(&key);
                    }
                }
            }
        }
    }

    /// Any fragment still present in more than one result marks a break
    /// the curator made within it: split it between its claimants.
    fn cut_remaining_overhangs(&mut self) -> Result<()> {
        let keys: Vec<FragmentKey> = self.multi.iter().cloned().collect();
        for key in keys {
            let fnd = &self.found[&key];
            let fragment = fnd.fragment.clone();
            let claimants = fnd.results.clone();
            self.cut_fragment(&fragment, &claimants)?;
        }
        self.multi.clear();
        Ok(())
    }

    /// Make a new fragment for the region of `frag` claimed by each
    /// result. Claimants are ordered by the fragment start they would keep
    /// after trimming their bait overhang; boundaries chain so that each
    /// sub-fragment starts where the previous one ended.
    fn cut_fragment(&mut self, frag: &Fragment, claimants: &[usize]) -> Result<()> {
        let mut order: Vec<(i64, usize)> = Vec::with_capacity(claimants.len());
        for &ridx in claimants {
            order.push((self.results[ridx].fragment_start_if_trimmed(frag)?, ridx));
        }
        order.sort_by_key(|(start, _)| *start);

        let last_i = order.len() - 1;
        let mut bound = frag.start();
        let mut sub_fragments = Vec::with_capacity(order.len());
        for (k, &(_, ridx)) in order.iter().enumerate() {
            let new_end = if k == last_i {
                frag.end()
            } else {
                let (_, claimed_end) = self.results[ridx].claimed_fragment_region(frag)?;
                claimed_end
            };
            let sub = self.results[ridx]
                .cut_terminal_fragment(frag, bound, new_end)
                .with_context(|| format!("Cutting fragment {frag}"))?;
            bound = sub.end() + 1;
            sub_fragments.push(sub);
        }

        qc_sub_fragments(frag, &sub_fragments)?;
        self.cuts += sub_fragments.len() - 1;
        warn!(
            "Fragment {} cut into:\n{}",
            frag,
            sub_fragments
                .iter()
                .map(|sub| format!("  {sub}\n"))
                .collect::<String>()
        );
        Ok(())
    }

    /// Input fragments never pulled into any curated scaffold are emitted
    /// as fresh unplaced scaffolds under their input names. A gap lying
    /// directly between two surviving neighbours is kept; elided regions
    /// get the default gap.
    fn add_missing_scaffolds_from_input(&mut self, input_asm: &IndexedAssembly) {
        for scffld in input_asm.scaffolds() {
            let mut new_scffld: Option<Scaffold> = None;
            let mut last_added_i: Option<usize> = None;
            for (i, row) in scffld.rows.iter().enumerate() {
                let Row::Fragment(frag) = row else {
                    continue;
                };
                if self.found.contains_key(&frag.key()) {
                    continue;
                }
                let ns = new_scffld.get_or_insert_with(|| {
                    let mut s = Scaffold::new(&scffld.name);
                    s.rank = Rank::Unplaced;
                    s
                });
                if let Some(last) = last_added_i {
                    if last != i - 1 {
                        // The previously added row was not this fragment's
                        // neighbour in the input scaffold
                        match &scffld.rows[i - 1] {
                            Row::Gap(g) => ns.add_row(Row::Gap(g.clone())),
                            Row::Fragment(_) => {
                                ns.add_row(Row::Gap(self.options.default_gap.clone()))
                            }
                        }
                    }
                }
                ns.add_row(Row::Fragment(frag.clone()));
                last_added_i = Some(i);
            }

            if let Some(mut ns) = new_scffld {
                ns.haplotype = self.namer.haplotype_for_missing(&scffld.name);
                if self.namer.target_tags && !scffld.fragment_tags().contains("Target") {
                    ns.tag = Some(ScaffoldTag::Contaminant);
                }
                self.extra_scaffolds.push(ns);
            }
        }
    }

    /// Fuse the labelled pieces by `(haplotype, name)`, split oversize
    /// scaffolds at gaps, name the chromosomes and bucket everything into
    /// output assemblies.
    pub fn output_assemblies(mut self) -> Result<IndexMap<AsmKey, Assembly>> {
        let gap = self.options.default_gap.clone();
        let mut fused: IndexMap<(Option<String>, String), Scaffold> = IndexMap::new();

        let results = std::mem::take(&mut self.results);
        let extras = std::mem::take(&mut self.extra_scaffolds);
        let pieces = results
            .into_iter()
            .map(OverlapResult::to_scaffold)
            .chain(extras);
        for piece in pieces {
            if piece.rows.is_empty() {
                // Trimmed down to nothing by overhang resolution
                continue;
            }
            let key = (piece.haplotype.clone(), piece.name.clone());
            match fused.entry(key) {
                indexmap::map::Entry::Occupied(mut entry) => {
                    entry.get_mut().append_scaffold(piece, Some(&gap));
                }
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert(piece);
                }
            }
        }

        // Split scaffolds too long for downstream tooling
        let mut flat: Vec<Scaffold> = Vec::new();
        for (_, scffld) in fused {
            match self.options.max_contig_length {
                Some(max) if scffld.length() > max => {
                    flat.extend(split_oversize(scffld, max)?);
                }
                _ => flat.push(scffld),
            }
        }

        // Group and number the autosomes across haplotypes, and prefix
        // named chromosomes and unplaced haplotype scaffolds
        let mut chr_namer = ChrNamer::new(
            self.options.autosome_prefix.clone(),
            self.options.allow_consecutive_autosomes,
        );
        for (i, s) in flat.iter().enumerate() {
            if s.tag.is_none() && s.rank == Rank::Autosome {
                chr_namer.add_scaffold(s.haplotype.clone(), i);
            }
        }
        chr_namer.name_chromosomes(&mut flat)?;
        for s in flat.iter_mut() {
            if s.tag.is_some() {
                continue;
            }
            match s.rank {
                Rank::Named => {
                    let hap = s.haplotype.clone();
                    chr_namer.add_chr_prefix(s, hap.as_deref());
                }
                Rank::Unplaced => {
                    if let Some(hap) = s.haplotype.clone() {
                        ChrNamer::add_haplotype_prefix(s, &hap);
                    }
                }
                _ => {}
            }
        }

        // Bucket into output assemblies
        let mut buckets: IndexMap<AsmKey, Assembly> = IndexMap::new();
        for s in flat {
            let (key, curated) = match s.tag {
                Some(tag) => (Some(tag.as_str().to_string()), false),
                None => (s.haplotype.clone(), true),
            };
            let asm = buckets.entry(key).or_insert_with(|| {
                let mut a = Assembly::new(self.name.clone());
                a.curated = curated;
                a
            });
            asm.add_scaffold(s);
        }
        for asm in buckets.values_mut() {
            asm.smart_sort_scaffolds();
        }

        Ok(buckets)
    }
}

/// Check that the sub-fragments of a cut abut each other, do not overlap,
/// and cover the original fragment exactly.
fn qc_sub_fragments(frag: &Fragment, sub_fragments: &[Fragment]) -> Result<()> {
    let mut msg = String::new();

    let total: i64 = sub_fragments.iter().map(Fragment::length).sum();
    if total != frag.length() {
        msg.push_str(&format!(
            "Sub fragment lengths sum to {total}, expected {}\n",
            frag.length()
        ));
    }

    let mut abut_count = 0;
    let mut overlap_count = 0;
    let mut max_gap = 0;
    for i in 0..sub_fragments.len() {
        for j in (i + 1)..sub_fragments.len() {
            let frag_a = &sub_fragments[i];
            let frag_b = &sub_fragments[j];
            if frag_a.abuts(frag_b) {
                abut_count += 1;
            }
            if frag_a.overlaps(frag_b) {
                overlap_count += 1;
            }
            if let Some(g) = frag_a.gap_between(frag_b) {
                max_gap = max_gap.max(g);
            }
        }
    }
    if overlap_count != 0 {
        msg.push_str(&format!(
            "Expecting 0 but got {overlap_count} overlaps in new sub fragments\n"
        ));
    }
    if abut_count != sub_fragments.len() - 1 {
        msg.push_str(&format!(
            "Expecting {} abutting sub fragments but got {abut_count}\n",
            sub_fragments.len() - 1
        ));
    }
    if max_gap > 0 {
        msg.push_str(&format!("Gap of {max_gap} between sub fragments\n"));
    }

    if msg.is_empty() {
        Ok(())
    } else {
        bail!("Bad cut of fragment {frag}:\n{msg}")
    }
}

/// Cut a fused scaffold into `ceil(length / max)` parts at the gaps nearest
/// the ideal division points, working through the remainder so each cut
/// targets `remaining / parts_left`.
fn split_oversize(scffld: Scaffold, max: i64) -> Result<Vec<Scaffold>> {
    let total_parts = ((scffld.length() + max - 1) / max) as usize;
    let base_name = scffld.name.clone();
    let mut rest = scffld;
    let mut parts: Vec<Scaffold> = Vec::with_capacity(total_parts);

    for parts_left in (2..=total_parts).rev() {
        let ideal = rest.length() / parts_left as i64;

        // Find the gap row nearest the ideal division point
        let mut best: Option<(i64, usize)> = None;
        let mut pos = 0;
        for (i, row) in rest.rows.iter().enumerate() {
            if row.is_gap() {
                let mid = pos + row.length() / 2;
                let dist = (mid - ideal).abs();
                if best.map_or(true, |(d, _)| dist < d) {
                    best = Some((dist, i));
                }
            }
            pos += row.length();
        }
        let Some((_, cut_i)) = best else {
            bail!(
                "No gap found to split scaffold '{base_name}' ({} bp) into {total_parts} parts",
                rest.length()
            );
        };

        let mut head = rest.clone();
        head.rows = rest.rows[..cut_i].to_vec();
        rest.rows = rest.rows[cut_i + 1..].to_vec();
        parts.push(head);
    }
    parts.push(rest);

    for (i, part) in parts.iter_mut().enumerate() {
        part.name = format!("{}_{}", base_name, i + 1);
    }
    info!(
        "Split scaffold '{base_name}' into {} parts",
        parts.len()
    );
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::Row;

    fn frag(name: &str, start: i64, end: i64) -> Fragment {
        Fragment::new(name, start, end, 1).unwrap()
    }

    fn input_one_scaffold(name: &str, rows: Vec<Row>) -> IndexedAssembly {
        let mut ia = IndexedAssembly::new("input");
        ia.add_scaffold(Scaffold::with_rows(name, rows)).unwrap();
        ia
    }

    fn pretext(bp_per_texel: f64, scaffolds: Vec<Scaffold>) -> Assembly {
        let mut asm = Assembly::new("pretext");
        asm.set_bp_per_texel(bp_per_texel);
        for s in scaffolds {
            asm.add_scaffold(s);
        }
        asm
    }

    fn painted(name: &str, baits: Vec<Fragment>) -> Scaffold {
        let rows = baits
            .into_iter()
            .map(|mut b| {
                b = Fragment::with_tags(
                    b.name(),
                    b.start(),
                    b.end(),
                    b.strand(),
                    vec!["Painted".to_string()],
                )
                .unwrap();
                Row::Fragment(b)
            })
            .collect();
        Scaffold::with_rows(name, rows)
    }

    /// A curated map placing one whole input scaffold in one bait gives
    /// back the input scaffold unchanged.
    #[test]
    fn trivial_no_op() {
        let input = input_one_scaffold("s1", vec![Row::Fragment(frag("s1", 1, 10_000))]);
        let prtxt = pretext(
            100.0,
            vec![painted("New_1", vec![frag("s1", 1, 10_000)])],
        );

        let mut build = BuildAssembly::new("test", BuildOptions::default());
        build.remap_to_input_assembly(&prtxt, &input).unwrap();
        assert_eq!(101, build.error_length());
        let out = build.output_assemblies().unwrap();
        assert_eq!(1, out.len());
        let asm = &out[&None];
        assert_eq!(1, asm.scaffolds.len());
        let s = &asm.scaffolds[0];
        assert_eq!(1, s.rows.len());
        assert_eq!(&frag("s1", 1, 10_000), s.rows[0].as_fragment().unwrap());
        assert_eq!(10_000, asm.fragments_length());
    }

    /// A 20kb input fragment split by two baits overlapping by 1001 bp of
    /// pixel rounding. Neither side can be discarded, so the fragment is
    /// cut, with the boundary at the first bait's end.
    #[test]
    fn cut_at_texel_boundary() {
        let input = input_one_scaffold("s1", vec![Row::Fragment(frag("s1", 1, 20_000))]);
        let prtxt = pretext(
            100.0,
            vec![
                painted("R1", vec![frag("s1", 1, 12_000)]),
                painted("R2", vec![frag("s1", 11_000, 20_000)]),
            ],
        );

        let mut build = BuildAssembly::new("test", BuildOptions::default());
        build.remap_to_input_assembly(&prtxt, &input).unwrap();
        assert_eq!(1, build.cuts());
        let out = build.output_assemblies().unwrap();
        let asm = &out[&None];
        assert_eq!(2, asm.scaffolds.len());

        let r1 = &asm.scaffolds[0];
        let r2 = &asm.scaffolds[1];
        let f1 = r1.rows[0].as_fragment().unwrap();
        let f2 = r2.rows[0].as_fragment().unwrap();
        assert_eq!((1, 12_000), (f1.start(), f1.end()));
        assert!(f1.has_tag("Cut"));
        assert_eq!((12_001, 20_000), (f2.start(), f2.end()));
        assert!(f2.has_tag("Cut"));
        assert_eq!(20_000, f1.length() + f2.length());
        assert!(asm.find_overlapping_fragments().is_empty());
    }

    /// A fragment whose overlap with both baits is below the texel error
    /// is discarded from the side with the smaller bait overlap.
    #[test]
    fn overhang_resolver_prefers_shorter_overlap() {
        let input = input_one_scaffold(
            "s1",
            vec![
                Row::Fragment(frag("s1", 1, 50_000)),
                Row::Gap(Gap::new(200, "scaffold")),
                Row::Fragment(frag("s1", 50_201, 50_400)),
                Row::Gap(Gap::new(200, "scaffold")),
                Row::Fragment(frag("s1", 50_601, 100_000)),
            ],
        );
        // Both baits cover under err_length (101) of the middle fragment:
        // R1 covers 50_201..50_300 (100 bp), R2 covers 50_302..50_400
        // (99 bp), and neither overhang exceeds the error length
        let prtxt = pretext(
            100.0,
            vec![
                painted("R1", vec![frag("s1", 1, 50_300)]),
                painted("R2", vec![frag("s1", 50_302, 100_000)]),
            ],
        );

        let mut build = BuildAssembly::new("test", BuildOptions::default());
        build.remap_to_input_assembly(&prtxt, &input).unwrap();
        assert_eq!(0, build.cuts());
        let out = build.output_assemblies().unwrap();
        let asm = &out[&None];
        assert_eq!(2, asm.scaffolds.len());

        // R2 had the shorter bait overlap, so R1 keeps the fragment
        let r1 = &asm.scaffolds[0];
        let r2 = &asm.scaffolds[1];
        assert_eq!(3, r1.rows.len());
        assert_eq!(1, r2.rows.len());
        assert_eq!(
            50_400,
            r1.fragments().last().map(Fragment::end).unwrap()
        );
        assert!(asm.find_overlapping_fragments().is_empty());
    }

    /// Input scaffolds the curator never placed are added back as
    /// unplaced scaffolds, preserving their internal gaps.
    #[test]
    fn missing_input_is_recovered() {
        let mut ia = IndexedAssembly::new("input");
        ia.add_scaffold(Scaffold::with_rows(
            "s1",
            vec![Row::Fragment(frag("s1", 1, 10_000))],
        ))
        .unwrap();
        ia.add_scaffold(Scaffold::with_rows(
            "s2",
            vec![
                Row::Fragment(frag("s2", 1, 4_000)),
                Row::Gap(Gap::new(100, "contig")),
                Row::Fragment(frag("s2", 4_101, 8_000)),
            ],
        ))
        .unwrap();
        let prtxt = pretext(
            100.0,
            vec![painted("R1", vec![frag("s1", 1, 10_000)])],
        );

        let mut build = BuildAssembly::new("test", BuildOptions::default());
        build.remap_to_input_assembly(&prtxt, &ia).unwrap();
        let out = build.output_assemblies().unwrap();
        let asm = &out[&None];
        assert_eq!(2, asm.scaffolds.len());
        let missing = asm
            .scaffolds
            .iter()
            .find(|s| s.name == "s2")
            .expect("s2 recovered");
        assert_eq!(Rank::Unplaced, missing.rank);
        assert_eq!(3, missing.rows.len());
        assert_eq!("contig", match &missing.rows[1] {
            Row::Gap(g) => g.gap_type(),
            _ => panic!("expected gap"),
        });
    }

    /// Baits from the same curated scaffold fuse into one output scaffold
    /// with the default gap between blocks, and a reverse strand bait is
    /// reverse-complemented into it.
    #[test]
    fn fusion_joins_blocks_with_default_gap() {
        let mut ia = IndexedAssembly::new("input");
        ia.add_scaffold(Scaffold::with_rows(
            "s1",
            vec![Row::Fragment(frag("s1", 1, 10_000))],
        ))
        .unwrap();
        ia.add_scaffold(Scaffold::with_rows(
            "s2",
            vec![Row::Fragment(frag("s2", 1, 5_000))],
        ))
        .unwrap();
        let prtxt = pretext(
            100.0,
            vec![painted(
                "R1",
                vec![
                    frag("s1", 1, 10_000),
                    Fragment::new("s2", 1, 5_000, -1).unwrap(),
                ],
            )],
        );

        let mut build = BuildAssembly::new("test", BuildOptions::default());
        build.remap_to_input_assembly(&prtxt, &ia).unwrap();
        let out = build.output_assemblies().unwrap();
        let asm = &out[&None];
        assert_eq!(1, asm.scaffolds.len());
        let s = &asm.scaffolds[0];
        assert_eq!(3, s.rows.len());
        assert!(s.rows[1].is_gap());
        let f2 = s.rows[2].as_fragment().unwrap();
        assert_eq!("s2", f2.name());
        assert_eq!(-1, f2.strand());
        assert_eq!(15_200, s.length());
    }

    /// Scenario: contaminants route to their own assembly and haplotigs
    /// to theirs.
    #[test]
    fn tag_buckets_are_split_out() {
        let mut ia = IndexedAssembly::new("input");
        for (name, len) in [("s1", 10_000), ("s2", 5_000), ("s3", 4_000)] {
            ia.add_scaffold(Scaffold::with_rows(
                name,
                vec![Row::Fragment(frag(name, 1, len))],
            ))
            .unwrap();
        }
        let mut contaminated = Scaffold::new("R2");
        contaminated.add_row(Row::Fragment(
            Fragment::with_tags("s2", 1, 5_000, 1, vec!["Contaminant".to_string()]).unwrap(),
        ));
        let mut haplotig = Scaffold::new("R3");
        haplotig.add_row(Row::Fragment(
            Fragment::with_tags("s3", 1, 4_000, 1, vec!["Haplotig".to_string()]).unwrap(),
        ));
        let prtxt = pretext(
            100.0,
            vec![
                painted("R1", vec![frag("s1", 1, 10_000)]),
                contaminated,
                haplotig,
            ],
        );

        let mut build = BuildAssembly::new("test", BuildOptions::default());
        build.remap_to_input_assembly(&prtxt, &ia).unwrap();
        let out = build.output_assemblies().unwrap();
        assert_eq!(3, out.len());
        assert!(out[&None].curated);
        let cont = &out[&Some("Contaminant".to_string())];
        assert!(!cont.curated);
        assert_eq!(1, cont.scaffolds.len());
        let htig = &out[&Some("Haplotig".to_string())];
        assert_eq!("H_1", htig.scaffolds[0].name);
    }

    #[test]
    fn oversize_scaffold_is_split_at_gaps() {
        let mut rows = Vec::new();
        for i in 0..10 {
            if i > 0 {
                rows.push(Row::Gap(Gap::new(200, "scaffold")));
            }
            let start = 1 + i * 1_000_000;
            rows.push(Row::Fragment(frag("s1", start, start + 999_999)));
        }
        let scffld = Scaffold::with_rows("big", rows);
        let parts = split_oversize(scffld, 4_200_000).unwrap();
        assert_eq!(3, parts.len());
        assert_eq!("big_1", parts[0].name);
        assert_eq!("big_3", parts[2].name);
        assert!(parts.iter().all(|p| p.length() <= 4_200_000));
        let frag_total: i64 = parts.iter().map(Scaffold::fragments_length).sum();
        assert_eq!(10_000_000, frag_total);
    }

    #[test]
    fn oversize_scaffold_without_gaps_fails() {
        let scffld = Scaffold::with_rows(
            "solid",
            vec![Row::Fragment(frag("s1", 1, 10_000_000))],
        );
        assert!(split_oversize(scffld, 4_000_000).is_err());
    }
}
