//! # Overhang resolution
//!
//! A single input fragment pulled into two curated scaffolds means the
//! curator either broke the assembly next to it (pixel rounding noise at
//! one end, fixed by discarding a terminal row) or within it (a real cut).
//! [`OverhangResolver`] weighs up "what-if" [`OverhangPremise`]s for the
//! first case; what it cannot resolve is cut by the build pipeline.
//!
//! OverlapResults live in an arena (`Vec`) owned by the build; premises and
//! found-fragment records refer to them by index.
use indexmap::IndexMap;

use crate::fragment::{Fragment, FragmentKey};
use crate::overlap_result::OverlapResult;

/// A fragment found during overlap collection and the arena indices of the
/// OverlapResults it was found in.
#[derive(Debug)]
pub struct FoundFragment {
    pub fragment: Fragment,
    pub results: Vec<usize>,
}

impl FoundFragment {
    pub fn new(fragment: Fragment) -> FoundFragment {
        FoundFragment {
            fragment,
            results: Vec::new(),
        }
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn add_result(&mut self, idx: usize) {
        self.results.push(idx);
    }

    pub fn remove_result(&mut self, idx: usize) {
        if let Some(pos) = self.results.iter().position(|r| *r == idx) {
            self.results.remove(pos);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PremiseEnd {
    Start,
    End,
}

/// A "what-if" for the removal of a terminal fragment from one
/// OverlapResult. All metrics are captured when the premise is built, so a
/// round of fixes works from a consistent snapshot.
#[derive(Debug, Clone)]
pub struct OverhangPremise {
    pub result: usize,
    pub end: PremiseEnd,
    pub fragment: Fragment,
    /// Overlap of the bait with the shared terminal row.
    pub bait_overlap: i64,
    /// The overhang at this end were the premise applied.
    pub overhang_if_applied: i64,
    /// |overhang after| - |overhang before|: negative means applying the
    /// premise brings the result closer to its bait.
    pub error_delta: i64,
    single_row: bool,
}

impl OverhangPremise {
    /// Returns `None` when `fragment` is not a terminal row of the result.
    pub fn new(idx: usize, result: &OverlapResult, fragment: &Fragment) -> Option<OverhangPremise> {
        let first = result
            .rows()
            .first()
            .and_then(|r| r.as_fragment())
            .is_some_and(|f| f == fragment);
        let last = result
            .rows()
            .last()
            .and_then(|r| r.as_fragment())
            .is_some_and(|f| f == fragment);

        let (end, bait_overlap, overhang_if_applied, overhang_before) = if first {
            (
                PremiseEnd::Start,
                result.start_row_bait_overlap(),
                result.overhang_if_start_removed(),
                result.start_overhang(),
            )
        } else if last {
            (
                PremiseEnd::End,
                result.end_row_bait_overlap(),
                result.overhang_if_end_removed(),
                result.end_overhang(),
            )
        } else {
            return None;
        };

        Some(OverhangPremise {
            result: idx,
            end,
            fragment: fragment.clone(),
            bait_overlap,
            overhang_if_applied,
            error_delta: overhang_if_applied.abs() - overhang_before.abs(),
            single_row: result.rows().len() == 1,
        })
    }

    /// Applying must strictly shrink the overhang, must not leave the
    /// result more than three texel errors short of its bait (that points
    /// to a cut, not a discard), and must not empty the result.
    pub fn improves(&self, err_length: i64) -> bool {
        if self.single_row {
            return false;
        }
        self.error_delta < 0 && self.overhang_if_applied >= -3 * err_length
    }

    pub fn makes_worse(&self, err_length: i64) -> bool {
        !self.improves(err_length)
    }

    pub fn apply(&self, results: &mut [OverlapResult]) {
        match self.end {
            PremiseEnd::Start => results[self.result].discard_start(),
            PremiseEnd::End => results[self.result].discard_end(),
        }
    }
}

/// One round of pairwise decisions over every fragment shared between
/// OverlapResults.
#[derive(Default)]
pub struct OverhangResolver {
    premises_by_fragment: IndexMap<FragmentKey, Vec<OverhangPremise>>,
}

impl OverhangResolver {
    pub fn new() -> OverhangResolver {
        OverhangResolver::default()
    }

    pub fn add_overhang_premise(&mut self, fragment: &Fragment, idx: usize, result: &OverlapResult) {
        if let Some(premise) = OverhangPremise::new(idx, result, fragment) {
            self.premises_by_fragment
                .entry(fragment.key())
                .or_default()
                .push(premise);
        }
    }

    /// Perform one round of fixes, returning the premises applied.
    ///
    /// With exactly two premises both overlapping their bait by less than
    /// one texel error, the fragment is rounding noise on both sides and
    /// the shorter bait overlap loses (first added wins a tie). Otherwise
    /// the premise with the best error delta is applied only when it
    /// strictly improves and the runner-up would make things worse.
    pub fn make_fixes(
        mut self,
        results: &mut [OverlapResult],
        err_length: i64,
    ) -> Vec<OverhangPremise> {
        let mut fixes_made = Vec::new();
        for (_, prem_list) in self.premises_by_fragment.iter_mut() {
            // Only fragments present in more than one result can lose a
            // copy, or sequence would go missing from the assembly.
            if prem_list.len() < 2 {
                continue;
            }

            if prem_list.len() == 2
                && prem_list.iter().all(|p| p.bait_overlap < err_length)
            {
                let shorter = if prem_list[1].bait_overlap < prem_list[0].bait_overlap {
                    &prem_list[1]
                } else {
                    &prem_list[0]
                };
                shorter.apply(results);
                fixes_made.push(shorter.clone());
                continue;
            }

            prem_list.sort_by_key(|p| p.error_delta);
            let bst = &prem_list[0];
            let nxt = &prem_list[1];
            if bst.improves(err_length) && nxt.makes_worse(err_length) {
                bst.apply(results);
                fixes_made.push(bst.clone());
            }
        }

        fixes_made
    }
}
