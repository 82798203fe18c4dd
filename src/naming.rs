//! # Scaffold and chromosome naming
//!
//! [`ScaffoldNamer`] walks the curated map classifying each scaffold from
//! its tags (chromosome name, haplotype, disposition) and labels the
//! overlap results built from it. [`ChrNamer`] then groups the autosomes
//! across haplotypes, sorts the groups by the size of the first haplotype
//! and assigns the final `SUPER_1`, `SUPER_2A`/`2B`, ... names.
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;

use anyhow::{bail, Result};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use regex::Regex;

use crate::fragment::Fragment;
use crate::overlap_result::OverlapResult;
use crate::scaffold::{Rank, Scaffold, ScaffoldTag};
use crate::table::{Style, TerminalTable};

/// An error in the tags applied in PretextView.
#[derive(Debug)]
pub struct TaggingError(pub String);

impl fmt::Display for TaggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TaggingError {}

/// An error in the expected pattern of scaffolds and haplotypes when naming
/// the autosomes. Carries rendered table slices showing the problem groups.
#[derive(Debug)]
pub struct ChrNamerError {
    pub message: String,
    pub tables: Vec<String>,
}

impl fmt::Display for ChrNamerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        for tbl in &self.tables {
            write!(f, "{tbl}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ChrNamerError {}

fn chr_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z]\d*[A-Z]?|[IVX_]+|\d+[A-Z]+)$").unwrap())
}

fn haplotype_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^_]+)_.+_\d+$").unwrap())
}

const OTHER_KNOWN_TAGS: &[&str] = &[
    "Contaminant",
    "Cut",
    "FalseDuplicate",
    "Haplotig",
    "Singleton",
    "Unloc",
];

/// Labels scaffolds with named chromosomes (sex chromosomes, B
/// chromosomes), ranks and haplotypes as the curated map is processed.
/// Also records each result's name in the curated map under
/// `original_name`.
pub struct ScaffoldNamer {
    pub current_scaffold_name: Option<String>,
    pub current_rank: Rank,
    pub current_haplotype: Option<String>,
    pub primary_haplotype: Option<String>,
    /// Set once a `Target` tag has been seen anywhere in the map, after
    /// which untagged scaffolds are treated as contaminants.
    pub target_tags: bool,
    haplotig_n: usize,
    haplotig_results: Vec<usize>,
    unloc_n: usize,
    unloc_groups: Vec<Vec<usize>>,
    /// Haplotype names stored under their lower case names, so the first
    /// occurrence fixes the case.
    haplotype_lc: HashMap<String, String>,
}

impl ScaffoldNamer {
    pub fn new() -> ScaffoldNamer {
        ScaffoldNamer {
            current_scaffold_name: None,
            current_rank: Rank::Unset,
            current_haplotype: None,
            primary_haplotype: None,
            target_tags: false,
            haplotig_n: 0,
            haplotig_results: Vec::new(),
            unloc_n: 0,
            unloc_groups: Vec::new(),
            haplotype_lc: HashMap::new(),
        }
    }

    /// Using the tags on a curated scaffold, work out its haplotype,
    /// whether it has been given a chromosome name, and what its rank is.
    pub fn make_scaffold_name(&mut self, scaffold: &Scaffold) -> Result<()> {
        let mut scaffold_name: Option<String> = None;
        let mut haplotype: Option<String> = None;
        let mut is_painted = false;
        let mut rank = Rank::Unset;
        let mut primary_tag = false;

        for tag in scaffold.fragment_tags() {
            if tag == "Painted" {
                is_painted = true;
            } else if tag == "Target" {
                self.target_tags = true;
            } else if tag == "Primary" {
                primary_tag = true;
            } else if chr_name_re().is_match(&tag) {
                // A tag looking like a chromosome name, e.g. "X1", "I_II", "2RL"
                if let Some(existing) = &scaffold_name {
                    if *existing != tag {
                        bail!(TaggingError(format!(
                            "Found more than one scaffold_name name: '{existing}' and \
                             '{tag}' in scaffold:\n\n{scaffold}"
                        )));
                    }
                }
                scaffold_name = Some(tag);
                rank = Rank::Named;
            } else if !OTHER_KNOWN_TAGS.contains(&tag.as_str()) {
                // Any tag not looking like a chromosome name is assumed to
                // be a haplotype, and each scaffold can only have one
                if let Some(existing) = &haplotype {
                    bail!(TaggingError(format!(
                        "Found both '{existing}' and '{tag}', when only one is \
                         expected, in scaffold:\n\n{scaffold}"
                    )));
                }
                haplotype = Some(self.get_set_haplotype(&tag));
            }
        }

        if haplotype.is_none() {
            haplotype = self.haplotype_from_name(
                scaffold.first_fragment().map_or("", |f| f.name()),
            );
        }

        if primary_tag && self.primary_haplotype.is_none() {
            let Some(hap) = &haplotype else {
                bail!(TaggingError(format!(
                    "Failed to determine haplotype for Primary from scaffold:\n\n{scaffold}"
                )));
            };
            self.primary_haplotype = Some(hap.clone());
            debug!("Primary haplotype is '{hap}'");
        }

        let scaffold_name = match scaffold_name {
            Some(name) => name,
            None if is_painted => {
                if rank == Rank::Unset {
                    rank = Rank::Autosome;
                }
                scaffold.name.clone()
            }
            None => {
                // Unpainted scaffolds keep the name they have in the input
                // assembly
                rank = Rank::Unplaced;
                scaffold
                    .first_fragment()
                    .map_or_else(|| scaffold.name.clone(), |f| f.name().to_string())
            }
        };

        self.current_haplotype = match (&self.primary_haplotype, haplotype) {
            (Some(prim), Some(hap)) if *prim == hap => Some("Primary".to_string()),
            (_, hap) => hap,
        };
        self.current_scaffold_name = Some(scaffold_name);
        self.current_rank = rank;
        self.unloc_n = 0;
        self.unloc_groups.push(Vec::new());
        Ok(())
    }

    /// Label one overlap result with the current scaffold's name, rank and
    /// haplotype, routing Haplotig/Unloc/Contaminant/FalseDuplicate
    /// fragments to their special names and dispositions.
    pub fn label_scaffold(
        &mut self,
        idx: usize,
        result: &mut OverlapResult,
        fragment: &Fragment,
        scaffold_tags: &BTreeSet<String>,
        original_name: &str,
    ) -> Result<()> {
        let mut name = self
            .current_scaffold_name
            .clone()
            .unwrap_or_else(|| original_name.to_string());
        let mut rank = self.current_rank;

        if fragment.has_tag("Contaminant")
            || (self.target_tags && !scaffold_tags.contains("Target"))
        {
            result.scaffold.tag = Some(ScaffoldTag::Contaminant);
            rank = Rank::Unplaced;
        }
        if fragment.has_tag("FalseDuplicate") {
            result.scaffold.tag = Some(ScaffoldTag::FalseDuplicate);
            rank = Rank::Unplaced;
        } else if fragment.has_tag("Haplotig") {
            name = self.haplotig_name();
            result.scaffold.tag = Some(ScaffoldTag::Haplotig);
            rank = Rank::Unplaced;
            self.haplotig_results.push(idx);
        } else if fragment.has_tag("Unloc") {
            if !scaffold_tags.contains("Painted") {
                bail!(TaggingError(format!(
                    "Unloc in unpainted scaffold '{original_name}': {fragment}"
                )));
            }
            result.scaffold.chr_name = Some(name.clone());
            name = self.unloc_name();
            if let Some(group) = self.unloc_groups.last_mut() {
                group.push(idx);
            }
        } else if scaffold_tags.contains("Painted") {
            result.scaffold.localised = true;
            result.scaffold.chr_name = Some(name.clone());
        }

        result.scaffold.name = name;
        result.scaffold.haplotype = self.current_haplotype.clone();
        result.scaffold.rank = rank;
        result.scaffold.original_name = Some(original_name.to_string());
        result.scaffold.original_tags = scaffold_tags.clone();
        Ok(())
    }

    /// Haplotype recovered from an input scaffold name such as
    /// `hap1_scaffold_23`.
    pub fn haplotype_from_name(&mut self, name: &str) -> Option<String> {
        haplotype_prefix_re()
            .captures(name)
            .map(|m| self.get_set_haplotype(&m[1]))
    }

    /// Maps a haplotype through the primary, as `current_haplotype` is
    /// labelled. Used for scaffolds rebuilt from unfound input sequence.
    pub fn haplotype_for_missing(&mut self, name: &str) -> Option<String> {
        let hap = self.haplotype_from_name(name)?;
        match &self.primary_haplotype {
            Some(prim) if *prim == hap => Some("Primary".to_string()),
            _ => Some(hap),
        }
    }

    /// The first occurrence of a haplotype tag sets its case, i.e. "Hap1"
    /// will be used if it is seen before "HAP1".
    fn get_set_haplotype(&mut self, haplotype: &str) -> String {
        self.haplotype_lc
            .entry(haplotype.to_lowercase())
            .or_insert_with(|| haplotype.to_string())
            .clone()
    }

    fn haplotig_name(&mut self) -> String {
        self.haplotig_n += 1;
        format!("H_{}", self.haplotig_n)
    }

    fn unloc_name(&mut self) -> String {
        self.unloc_n += 1;
        format!(
            "{}_unloc_{}",
            self.current_scaffold_name.as_deref().unwrap_or_default(),
            self.unloc_n
        )
    }

    pub fn rename_haplotigs_by_size(&self, results: &mut [OverlapResult]) {
        rename_by_size(&self.haplotig_results, results);
    }

    pub fn rename_unlocs_by_size(&self, results: &mut [OverlapResult]) {
        for group in &self.unloc_groups {
            rename_by_size(group, results);
        }
    }
}

impl Default for ScaffoldNamer {
    fn default() -> Self {
        ScaffoldNamer::new()
    }
}

/// Reassign the names already given to `indices` so that the largest
/// scaffold gets the first name, the second largest the next, and so on.
fn rename_by_size(indices: &[usize], results: &mut [OverlapResult]) {
    if indices.is_empty() {
        return;
    }
    let names: Vec<String> = indices
        .iter()
        .map(|&i| results[i].scaffold.name.clone())
        .collect();
    let mut by_size: Vec<usize> = indices.to_vec();
    by_size.sort_by_key(|&i| std::cmp::Reverse(results[i].scaffold.length()));
    for (&i, name) in by_size.iter().zip(names) {
        results[i].scaffold.name = name;
    }
}

/// Adjacent chromosomes from each haplotype, grouped so they stay together
/// when the groups are sorted by the size of the first haplotype.
///
/// Each group is structured like:
///
/// ```text
/// ChrGroup {
///     data: {
///         "Hap1": { "Scaffold_9":  [Scaffold_9] },
///         "Hap2": { "Scaffold_10": [Scaffold_10, Scaffold_10_unloc_1] },
///     }
/// }
/// ```
struct ChrGroup {
    /// haplotype -> curated scaffold name -> flat-list scaffold indices
    data: IndexMap<Option<String>, IndexMap<String, Vec<usize>>>,
}

impl ChrGroup {
    fn new<'a>(haplotypes: impl Iterator<Item = &'a Option<String>>) -> ChrGroup {
        let mut data = IndexMap::new();
        for hap in haplotypes {
            data.insert(hap.clone(), IndexMap::new());
        }
        ChrGroup { data }
    }

    fn has_scaffolds_for(&self, hap: &Option<String>) -> bool {
        self.data.get(hap).is_some_and(|d| !d.is_empty())
    }

    fn add_scaffold(&mut self, hap: &Option<String>, orig: &str, idx: usize) {
        self.data
            .entry(hap.clone())
            .or_default()
            .entry(orig.to_string())
            .or_default()
            .push(idx);
    }

    fn original_tags_contain(
        &self,
        hap: &Option<String>,
        orig: &str,
        tag: &str,
        scaffolds: &[Scaffold],
    ) -> bool {
        self.data
            .get(hap)
            .and_then(|d| d.get(orig))
            .and_then(|list| list.first())
            .is_some_and(|&i| scaffolds[i].original_tags.contains(tag))
    }

    fn length_of_first_haplotype(&self, scaffolds: &[Scaffold]) -> i64 {
        let Some(first) = self.data.values().next() else {
            return 0;
        };
        first
            .values()
            .flatten()
            .map(|&i| scaffolds[i].fragments_length())
            .sum()
    }

    fn max_hap_set_count(&self) -> usize {
        self.data.values().map(IndexMap::len).max().unwrap_or(0)
    }

    /// The suffix "A", "B", "C" etc. is added to the chromosome name when a
    /// haplotype holds more than one scaffold in the group.
    fn multi_chr_list(chr_name: &str, multi_count: usize) -> Vec<String> {
        if multi_count == 1 {
            vec![chr_name.to_string()]
        } else {
            (0..multi_count)
                .map(|i| {
                    let ltr = char::from_u32('A' as u32 + i as u32).unwrap_or('?');
                    format!("{chr_name}{ltr}")
                })
                .collect()
        }
    }

    /// Replace the curated map's scaffold name with `<prefix><n><letter>`
    /// plus the haplotype suffix, for every haplotype in the group, e.g.
    ///
    /// ```text
    ///   "Scaffold_10"         -> "SUPER_9A"
    ///   "Scaffold_10_unloc_1" -> "SUPER_9A_unloc_1"
    ///   "Scaffold_11"         -> "SUPER_9B"
    /// ```
    fn name_chromosome(&self, chr_prefix: &str, chr_n: usize, scaffolds: &mut [Scaffold]) {
        for (hap_name, hap_set) in &self.data {
            let hap_suffix = match hap_name.as_deref() {
                None | Some("Primary") => String::new(),
                Some(hap) => format!("_{hap}"),
            };
            let chr_names = Self::multi_chr_list(&chr_n.to_string(), hap_set.len());
            for ((orig, scffld_list), this_chr) in hap_set.iter().zip(&chr_names) {
                for &i in scffld_list {
                    scaffolds[i].name = scaffolds[i]
                        .name
                        .replace(orig, &format!("{chr_prefix}{this_chr}{hap_suffix}"));
                    scaffolds[i].chr_name = Some(this_chr.clone());
                }
            }
        }
    }
}

/// Groups chromosomes across haplotypes, then sorts and names them.
pub struct ChrNamer {
    chr_prefix: String,
    allow_consecutive: bool,
    scaffold_entries: Vec<(Option<String>, usize)>,
    /// Haplotypes in first-seen order; order is significant, it decides
    /// which haplotype anchors the groups.
    haplotypes_seen: IndexSet<Option<String>>,
    groups: Vec<ChrGroup>,
}

impl ChrNamer {
    pub fn new(chr_prefix: impl Into<String>, allow_consecutive: bool) -> ChrNamer {
        ChrNamer {
            chr_prefix: chr_prefix.into(),
            allow_consecutive,
            scaffold_entries: Vec::new(),
            haplotypes_seen: IndexSet::new(),
            groups: Vec::new(),
        }
    }

    pub fn add_scaffold(&mut self, haplotype: Option<String>, idx: usize) {
        self.haplotypes_seen.insert(haplotype.clone());
        self.scaffold_entries.push((haplotype, idx));
    }

    /// Group, check, sort and number the captured autosomes, renaming them
    /// in `scaffolds`.
    pub fn name_chromosomes(&mut self, scaffolds: &mut [Scaffold]) -> Result<()> {
        if self.haplotypes_seen.is_empty() {
            // No autosomes to name
            return Ok(());
        }
        self.build_groups(scaffolds)?;
        self.groups
            .sort_by_key(|g| std::cmp::Reverse(g.length_of_first_haplotype(scaffolds)));
        for (i, grp) in self.groups.iter().enumerate() {
            grp.name_chromosome(&self.chr_prefix, i + 1, scaffolds);
        }
        Ok(())
    }

    /// Prefix a named chromosome: `X` becomes e.g. `SUPER_X`, with a
    /// haplotype suffix in multi-haplotype maps.
    pub fn add_chr_prefix(&self, scffld: &mut Scaffold, haplotype: Option<&str>) {
        if !scffld.name.starts_with(&self.chr_prefix) {
            scffld.name = format!("{}{}", self.chr_prefix, scffld.name);
        }
        if let Some(hap) = haplotype {
            if hap != "Primary" {
                let suffix = format!("_{hap}");
                if !scffld.name.to_lowercase().ends_with(&suffix.to_lowercase()) {
                    scffld.name.push_str(&suffix);
                }
            }
        }
    }

    /// Prefix an unplaced scaffold with its haplotype, e.g. `Hap2_`.
    pub fn add_haplotype_prefix(scffld: &mut Scaffold, haplotype: &str) {
        if haplotype == "Primary" {
            return;
        }
        let prefix = format!("{haplotype}_");
        if !scffld.name.to_lowercase().starts_with(&prefix.to_lowercase()) {
            scffld.name = format!("{prefix}{}", scffld.name);
        }
    }

    fn check_for_painted_scaffolds_missing_haplotype_tag(
        &self,
        scaffolds: &[Scaffold],
    ) -> Result<()> {
        if self.haplotypes_seen.len() > 1 && self.haplotypes_seen.contains(&None) {
            let untagged: String = self
                .scaffold_entries
                .iter()
                .filter(|(hap, _)| hap.is_none())
                .map(|(_, i)| format!("  {}\n", scaffolds[*i].name))
                .collect();
            bail!(TaggingError(format!(
                "Haplotype tag missing from Painted scaffolds:\n{untagged}"
            )));
        }
        Ok(())
    }

    fn build_groups(&mut self, scaffolds: &[Scaffold]) -> Result<()> {
        self.check_for_painted_scaffolds_missing_haplotype_tag(scaffolds)?;

        let multiple_haplotypes = self.haplotypes_seen.len() > 1;
        self.groups.clear();
        self.groups
            .push(ChrGroup::new(self.haplotypes_seen.iter()));
        let mut last_haplotype: Option<Option<String>> = None;
        let mut last_orig: Option<String> = None;

        for (haplotype, idx) in &self.scaffold_entries {
            let Some(orig) = scaffolds[*idx].original_name.clone() else {
                bail!(
                    "Missing original_name value in Scaffold:\n{}",
                    scaffolds[*idx]
                );
            };

            // Is there already a scaffold for this haplotype in the group?
            let group = self.groups.last().unwrap();
            let mut start_new_group = false;
            if group.has_scaffolds_for(haplotype) {
                if multiple_haplotypes {
                    if last_haplotype.as_ref() != Some(haplotype) {
                        // A new haplotype which already has an entry in
                        // this group, so we must be in a new group
                        start_new_group = true;
                    } else if let Some(last) = &last_orig {
                        // Multiple scaffolds in a row share an
                        // original_name when there are unlocs
                        if *last != orig
                            && group.original_tags_contain(haplotype, last, "Singleton", scaffolds)
                        {
                            start_new_group = true;
                        }
                    }
                } else if last_orig.as_deref() != Some(orig.as_str()) {
                    // With a single haplotype, each curated scaffold name
                    // starts a new group; this keeps unlocs clustered with
                    // their chromosome
                    start_new_group = true;
                }
            }
            if start_new_group {
                self.groups
                    .push(ChrGroup::new(self.haplotypes_seen.iter()));
            }

            debug!("Adding scaffold to '{haplotype:?}':\n{}", scaffolds[*idx]);
            self.groups
                .last_mut()
                .unwrap()
                .add_scaffold(haplotype, &orig, *idx);
            last_haplotype = Some(haplotype.clone());
            last_orig = Some(orig);
        }

        let table = self.check_groups(scaffolds);
        if table.has_errors() {
            let s = if table.error_count() == 1 { "" } else { "s" };
            return Err(ChrNamerError {
                message: format!("Error{s} naming autosomes:"),
                tables: table.error_render(1),
            }
            .into());
        }
        debug!("\n{}", table.render());
        Ok(())
    }

    fn check_groups(&mut self, scaffolds: &[Scaffold]) -> TerminalTable {
        let mut tbl = TerminalTable::new();
        let hdr = tbl.new_header();
        for hap in &self.haplotypes_seen {
            hdr.new_cell()
                .new_line(hap.as_deref().unwrap_or("None"), Some(Style::Bold));
        }

        let mut ignore: BTreeSet<String> = self
            .haplotypes_seen
            .iter()
            .flatten()
            .cloned()
            .collect();
        ignore.insert("Cut".to_string());
        ignore.insert("Painted".to_string());

        for grp in &self.groups {
            let row_count = grp.max_hap_set_count();
            for row_idx in 0..row_count {
                let mut errors = Vec::new();
                {
                    let row = tbl.new_row();
                    for (i, hap) in self.haplotypes_seen.iter().enumerate() {
                        // Make a new cell, which may stay empty
                        let cell = row.new_cell();

                        let hap_set = grp.data.get(hap).filter(|d| !d.is_empty());
                        if let Some(hap_set) = hap_set {
                            let Some((scffld_name, scffld_list)) =
                                hap_set.get_index(row_idx)
                            else {
                                continue;
                            };
                            cell.new_line(scffld_name, None);

                            // The first haplotype should only have one
                            // scaffold in each group
                            if i == 0 && row_idx > 0 && !self.allow_consecutive {
                                cell.new_line(
                                    format!(
                                        "<Consecutive {}>",
                                        hap.as_deref().unwrap_or("None")
                                    ),
                                    Some(Style::BoldRed),
                                );
                                errors.push(());
                            }

                            let s_length: i64 = scffld_list
                                .iter()
                                .map(|&x| scaffolds[x].fragments_length())
                                .sum();
                            cell.new_line(
                                format!("{} bp", crate::utils::underscored(s_length)),
                                None,
                            );

                            let first = scffld_list.first().copied();
                            if let Some(first) = first {
                                for tag in &scaffolds[first].original_tags {
                                    if !ignore.contains(tag) {
                                        cell.new_line(tag, None);
                                    }
                                }
                            }
                        } else if row_idx == 0 && i == 0 {
                            // The first haplotype is missing from the group
                            cell.new_line("<empty>", Some(Style::BoldRed));
                            errors.push(());
                        }
                    }
                }
                for _ in errors {
                    tbl.mark_error();
                }
            }
        }

        tbl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::Row;

    fn frag_with_tags(name: &str, len: i64, tags: &[&str]) -> Fragment {
        Fragment::with_tags(
            name,
            1,
            len,
            1,
            tags.iter().map(|t| t.to_string()).collect(),
        )
        .unwrap()
    }

    fn curated_scaffold(name: &str, tags: &[&str]) -> Scaffold {
        Scaffold::with_rows(
            name,
            vec![Row::Fragment(frag_with_tags("scaffold_7", 10_000, tags))],
        )
    }

    #[test]
    fn painted_scaffold_is_autosome() {
        let mut namer = ScaffoldNamer::new();
        namer
            .make_scaffold_name(&curated_scaffold("Scaffold_3", &["Painted"]))
            .unwrap();
        assert_eq!(Some("Scaffold_3".to_string()), namer.current_scaffold_name);
        assert_eq!(Rank::Autosome, namer.current_rank);
        assert_eq!(None, namer.current_haplotype);
    }

    #[test]
    fn chromosome_name_tag_sets_named_rank() {
        let mut namer = ScaffoldNamer::new();
        for tag in ["X", "W", "B1", "I_II", "2RL"] {
            namer
                .make_scaffold_name(&curated_scaffold("Scaffold_1", &["Painted", tag]))
                .unwrap();
            assert_eq!(Some(tag.to_string()), namer.current_scaffold_name);
            assert_eq!(Rank::Named, namer.current_rank);
        }
    }

    #[test]
    fn two_chromosome_names_is_an_error() {
        let mut namer = ScaffoldNamer::new();
        let err = namer
            .make_scaffold_name(&curated_scaffold("Scaffold_1", &["Painted", "X", "W"]))
            .unwrap_err();
        assert!(err.downcast_ref::<TaggingError>().is_some());
    }

    #[test]
    fn unpainted_scaffold_keeps_input_name() {
        let mut namer = ScaffoldNamer::new();
        namer
            .make_scaffold_name(&curated_scaffold("Scaffold_8", &[]))
            .unwrap();
        assert_eq!(Some("scaffold_7".to_string()), namer.current_scaffold_name);
        assert_eq!(Rank::Unplaced, namer.current_rank);
    }

    #[test]
    fn haplotype_case_fixed_by_first_occurrence() {
        let mut namer = ScaffoldNamer::new();
        namer
            .make_scaffold_name(&curated_scaffold("Scaffold_1", &["Painted", "Hap1"]))
            .unwrap();
        assert_eq!(Some("Hap1".to_string()), namer.current_haplotype);
        namer
            .make_scaffold_name(&curated_scaffold("Scaffold_2", &["Painted", "HAP1"]))
            .unwrap();
        assert_eq!(Some("Hap1".to_string()), namer.current_haplotype);
    }

    #[test]
    fn two_haplotypes_is_an_error() {
        let mut namer = ScaffoldNamer::new();
        let err = namer
            .make_scaffold_name(&curated_scaffold(
                "Scaffold_1",
                &["Painted", "Hap1", "Hap2"],
            ))
            .unwrap_err();
        assert!(err.downcast_ref::<TaggingError>().is_some());
    }

    #[test]
    fn primary_requires_haplotype() {
        let mut namer = ScaffoldNamer::new();
        let err = namer
            .make_scaffold_name(&curated_scaffold("Scaffold_1", &["Painted", "Primary"]))
            .unwrap_err();
        assert!(err.downcast_ref::<TaggingError>().is_some());

        let mut namer = ScaffoldNamer::new();
        namer
            .make_scaffold_name(&curated_scaffold(
                "Scaffold_1",
                &["Painted", "Primary", "Hap1"],
            ))
            .unwrap();
        assert_eq!(Some("Hap1".to_string()), namer.primary_haplotype);
        assert_eq!(Some("Primary".to_string()), namer.current_haplotype);
    }

    fn labelled_result(
        namer: &mut ScaffoldNamer,
        idx: usize,
        frag_tags: &[&str],
        scaffold_tags: &[&str],
        len: i64,
    ) -> OverlapResult {
        let frag = frag_with_tags("scaffold_7", len, frag_tags);
        let mut result = OverlapResult::new(
            frag.clone(),
            1,
            len,
            vec![Row::Fragment(Fragment::new("input_1", 1, len, 1).unwrap())],
        );
        let tags: BTreeSet<String> = scaffold_tags.iter().map(|t| t.to_string()).collect();
        namer
            .label_scaffold(idx, &mut result, &frag, &tags, "Scaffold_1")
            .unwrap();
        result
    }

    #[test]
    fn unloc_requires_painted_scaffold() {
        let mut namer = ScaffoldNamer::new();
        namer
            .make_scaffold_name(&curated_scaffold("Scaffold_1", &[]))
            .unwrap();
        let frag = frag_with_tags("scaffold_7", 100, &["Unloc"]);
        let mut result = OverlapResult::new(
            frag.clone(),
            1,
            100,
            vec![Row::Fragment(Fragment::new("input_1", 1, 100, 1).unwrap())],
        );
        let tags: BTreeSet<String> = ["Unloc".to_string()].into_iter().collect();
        let err = namer
            .label_scaffold(0, &mut result, &frag, &tags, "Scaffold_1")
            .unwrap_err();
        assert!(err.downcast_ref::<TaggingError>().is_some());
    }

    #[test]
    fn unlocs_renamed_largest_first() {
        let mut namer = ScaffoldNamer::new();
        namer
            .make_scaffold_name(&curated_scaffold("Scaffold_1", &["Painted", "X"]))
            .unwrap();
        let mut results = vec![
            labelled_result(&mut namer, 0, &["Unloc"], &["Painted", "X", "Unloc"], 50_000),
            labelled_result(
                &mut namer,
                1,
                &["Unloc"],
                &["Painted", "X", "Unloc"],
                200_000,
            ),
            labelled_result(&mut namer, 2, &["Unloc"], &["Painted", "X", "Unloc"], 10_000),
        ];
        assert_eq!("X_unloc_1", results[0].scaffold.name);
        assert_eq!("X_unloc_2", results[1].scaffold.name);
        assert_eq!("X_unloc_3", results[2].scaffold.name);

        namer.rename_unlocs_by_size(&mut results);
        assert_eq!("X_unloc_2", results[0].scaffold.name);
        assert_eq!("X_unloc_1", results[1].scaffold.name);
        assert_eq!("X_unloc_3", results[2].scaffold.name);
    }

    #[test]
    fn haplotigs_get_sequential_names() {
        let mut namer = ScaffoldNamer::new();
        namer
            .make_scaffold_name(&curated_scaffold("Scaffold_1", &["Painted"]))
            .unwrap();
        let r1 = labelled_result(&mut namer, 0, &["Haplotig"], &["Painted", "Haplotig"], 500);
        let r2 = labelled_result(&mut namer, 1, &["Haplotig"], &["Painted", "Haplotig"], 900);
        assert_eq!("H_1", r1.scaffold.name);
        assert_eq!("H_2", r2.scaffold.name);
        assert_eq!(Some(ScaffoldTag::Haplotig), r1.scaffold.tag);
        assert_eq!(Rank::Unplaced, r1.scaffold.rank);
    }

    fn autosome(name: &str, hap: Option<&str>, orig: &str, length: i64) -> Scaffold {
        let mut s = Scaffold::with_rows(
            name,
            vec![Row::Fragment(
                Fragment::new("input_1", 1, length, 1).unwrap(),
            )],
        );
        s.rank = Rank::Autosome;
        s.haplotype = hap.map(str::to_string);
        s.original_name = Some(orig.to_string());
        s
    }

    /// Curated sequence Hap1:A(40Mb), Hap2:B(39Mb), Hap1:C(30Mb),
    /// Hap2:D(25Mb), Hap2:E(10Mb) groups into {A,B} and {C,D,E}, with D
    /// and E lettered because Hap2 holds two scaffolds in the group.
    #[test]
    fn multi_haplotype_grouping_and_naming() {
        let mut scaffolds = vec![
            autosome("Scaffold_A", Some("Hap1"), "Scaffold_A", 40_000_000),
            autosome("Scaffold_B", Some("Hap2"), "Scaffold_B", 39_000_000),
            autosome("Scaffold_C", Some("Hap1"), "Scaffold_C", 30_000_000),
            autosome("Scaffold_D", Some("Hap2"), "Scaffold_D", 25_000_000),
            autosome("Scaffold_E", Some("Hap2"), "Scaffold_E", 10_000_000),
        ];
        let mut namer = ChrNamer::new("SUPER_", false);
        for (i, s) in scaffolds.iter().enumerate() {
            namer.add_scaffold(s.haplotype.clone(), i);
        }
        namer.name_chromosomes(&mut scaffolds).unwrap();

        let names: Vec<&str> = scaffolds.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            vec![
                "SUPER_1_Hap1",
                "SUPER_1_Hap2",
                "SUPER_2_Hap1",
                "SUPER_2A_Hap2",
                "SUPER_2B_Hap2"
            ],
            names
        );
        assert_eq!(Some("2A".to_string()), scaffolds[3].chr_name);
    }

    #[test]
    fn single_haplotype_groups_by_original_name() {
        // Unlocs cluster with their chromosome; the smaller chromosome
        // groups after the larger despite emission order
        let mut scaffolds = vec![
            autosome("Scaffold_1", None, "Scaffold_1", 10_000_000),
            autosome("Scaffold_1_unloc_1", None, "Scaffold_1", 50_000),
            autosome("Scaffold_2", None, "Scaffold_2", 30_000_000),
        ];
        let mut namer = ChrNamer::new("SUPER_", false);
        for (i, s) in scaffolds.iter().enumerate() {
            namer.add_scaffold(s.haplotype.clone(), i);
        }
        namer.name_chromosomes(&mut scaffolds).unwrap();
        let names: Vec<&str> = scaffolds.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(vec!["SUPER_2", "SUPER_2_unloc_1", "SUPER_1"], names);
    }

    #[test]
    fn empty_first_haplotype_is_an_error() {
        // A Singleton in Hap2 starts a group that has no Hap1 entry
        let s_a = autosome("Scaffold_A", Some("Hap1"), "Scaffold_A", 40_000_000);
        let mut s_b = autosome("Scaffold_B", Some("Hap2"), "Scaffold_B", 39_000_000);
        s_b.original_tags.insert("Singleton".to_string());
        let s_c = autosome("Scaffold_C", Some("Hap2"), "Scaffold_C", 20_000_000);
        let mut scaffolds = vec![s_a, s_b, s_c];

        let mut namer = ChrNamer::new("SUPER_", false);
        namer.add_scaffold(Some("Hap1".to_string()), 0);
        namer.add_scaffold(Some("Hap2".to_string()), 1);
        namer.add_scaffold(Some("Hap2".to_string()), 2);
        let err = namer.name_chromosomes(&mut scaffolds).unwrap_err();
        let cne = err.downcast_ref::<ChrNamerError>().unwrap();
        assert!(cne.tables.concat().contains("<empty>"));
    }

    #[test]
    fn consecutive_first_haplotype_is_an_error() {
        let mut scaffolds = vec![
            autosome("Scaffold_A", Some("Hap1"), "Scaffold_A", 40_000_000),
            autosome("Scaffold_B", Some("Hap1"), "Scaffold_B", 20_000_000),
            autosome("Scaffold_C", Some("Hap2"), "Scaffold_C", 39_000_000),
        ];
        let mut namer = ChrNamer::new("SUPER_", false);
        namer.add_scaffold(Some("Hap1".to_string()), 0);
        namer.add_scaffold(Some("Hap1".to_string()), 1);
        namer.add_scaffold(Some("Hap2".to_string()), 2);
        let err = namer.name_chromosomes(&mut scaffolds).unwrap_err();
        let cne = err.downcast_ref::<ChrNamerError>().unwrap();
        assert!(cne.tables.concat().contains("<Consecutive Hap1>"));

        // The relaxed variant letters the consecutive scaffolds instead
        let mut scaffolds = vec![
            autosome("Scaffold_A", Some("Hap1"), "Scaffold_A", 40_000_000),
            autosome("Scaffold_B", Some("Hap1"), "Scaffold_B", 20_000_000),
            autosome("Scaffold_C", Some("Hap2"), "Scaffold_C", 39_000_000),
        ];
        let mut namer = ChrNamer::new("SUPER_", true);
        namer.add_scaffold(Some("Hap1".to_string()), 0);
        namer.add_scaffold(Some("Hap1".to_string()), 1);
        namer.add_scaffold(Some("Hap2".to_string()), 2);
        namer.name_chromosomes(&mut scaffolds).unwrap();
        let names: Vec<&str> = scaffolds.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            vec!["SUPER_1A_Hap1", "SUPER_1B_Hap1", "SUPER_1_Hap2"],
            names
        );
    }

    #[test]
    fn singleton_tag_starts_a_new_group() {
        let mut s_a = autosome("Scaffold_A", Some("Hap1"), "Scaffold_A", 40_000_000);
        s_a.original_tags.insert("Singleton".to_string());
        let mut s_b = autosome("Scaffold_B", Some("Hap1"), "Scaffold_B", 20_000_000);
        s_b.original_tags.insert("Singleton".to_string());
        let s_c = autosome("Scaffold_C", Some("Hap2"), "Scaffold_C", 19_000_000);
        let mut scaffolds = vec![s_a, s_b, s_c];

        let mut namer = ChrNamer::new("SUPER_", false);
        namer.add_scaffold(Some("Hap1".to_string()), 0);
        namer.add_scaffold(Some("Hap1".to_string()), 1);
        namer.add_scaffold(Some("Hap2".to_string()), 2);
        namer.name_chromosomes(&mut scaffolds).unwrap();
        let names: Vec<&str> = scaffolds.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            vec!["SUPER_1_Hap1", "SUPER_2_Hap1", "SUPER_2_Hap2"],
            names
        );
    }

    #[test]
    fn chr_and_haplotype_prefixes() {
        let namer = ChrNamer::new("SUPER_", false);
        let mut x = Scaffold::new("X");
        namer.add_chr_prefix(&mut x, None);
        assert_eq!("SUPER_X", x.name);
        namer.add_chr_prefix(&mut x, None);
        assert_eq!("SUPER_X", x.name);

        let mut w = Scaffold::new("W");
        namer.add_chr_prefix(&mut w, Some("Hap2"));
        assert_eq!("SUPER_W_Hap2", w.name);

        let mut unplaced = Scaffold::new("scaffold_12");
        ChrNamer::add_haplotype_prefix(&mut unplaced, "Hap2");
        assert_eq!("Hap2_scaffold_12", unplaced.name);
        ChrNamer::add_haplotype_prefix(&mut unplaced, "Hap2");
        assert_eq!("Hap2_scaffold_12", unplaced.name);
        let mut primary = Scaffold::new("scaffold_12");
        ChrNamer::add_haplotype_prefix(&mut primary, "Primary");
        assert_eq!("scaffold_12", primary.name);
    }
}
