//! Reconciliation planner: decides which remote prefixes to delete.
//!
//! The planner compares the partitions that exist remotely against the
//! partitions regenerated by the current run, and produces an
//! [`ExclusionPlan`]: per hierarchy level, the set of partition keys whose
//! remote objects can be bulk-deleted before upload. A coarser prefix is
//! only ever promoted into the plan when every existing partition underneath
//! it was regenerated, so untouched data can never be deleted collaterally.

use std::collections::{BTreeMap, BTreeSet};

use crate::key::{
    COMBINED_DATE_LEVEL, DAY_LEVEL, MONTH_LEVEL, PartitionKey, TENANT_LEVEL, YEAR_LEVEL,
};

/// Per-level sets of partition keys safe to delete in bulk.
///
/// Levels are keyed by segment name (`idEmpresa`, `Ano`, `Mes`, `Dia`,
/// `AnoMesDia`). Entries covered by a coarser entry are removed on
/// promotion, so [`ExclusionPlan::covering_prefixes`] never yields two
/// prefixes that overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionPlan {
    levels: BTreeMap<String, BTreeSet<PartitionKey>>,
}

impl ExclusionPlan {
    /// Adds a key at the named level.
    pub fn insert(&mut self, level: &str, key: PartitionKey) {
        self.levels.entry(level.to_string()).or_default().insert(key);
    }

    /// Keys planned at the named level, if any.
    #[must_use]
    pub fn level(&self, level: &str) -> Option<&BTreeSet<PartitionKey>> {
        self.levels.get(level)
    }

    /// Whether the plan contains no deletions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.values().all(BTreeSet::is_empty)
    }

    /// Total number of planned keys across all levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.values().map(BTreeSet::len).sum()
    }

    /// Iterates `(level, key)` pairs across all levels.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PartitionKey)> {
        self.levels
            .iter()
            .flat_map(|(level, keys)| keys.iter().map(move |k| (level.as_str(), k)))
    }

    /// The minimal deduplicated set of prefixes covering every planned key.
    ///
    /// Sorted lexicographically, which places a parent before its
    /// descendants; a key covered by an already-accepted prefix is dropped.
    /// The delete phase relies on this to never list (and delete) the same
    /// object twice.
    #[must_use]
    pub fn covering_prefixes(&self) -> Vec<PartitionKey> {
        let all: BTreeSet<&PartitionKey> = self.levels.values().flatten().collect();
        let mut prefixes: Vec<PartitionKey> = Vec::new();
        for key in all {
            if !prefixes.iter().any(|accepted| accepted.covers(key)) {
                prefixes.push(key.clone());
            }
        }
        prefixes
    }

    /// Whether any planned key covers `key`.
    #[must_use]
    pub fn covers(&self, key: &PartitionKey) -> bool {
        self.levels
            .values()
            .flatten()
            .any(|planned| planned.covers(key))
    }

    /// Removes every entry covered by `parent` (used when promoting a
    /// coarser prefix that supersedes them).
    fn remove_covered_by(&mut self, parent: &PartitionKey) {
        for keys in self.levels.values_mut() {
            keys.retain(|k| !parent.covers(k));
        }
    }
}

/// Computes the exclusion plan for one dataset.
///
/// `existing` is the full tenant-scoped set of partitions currently present
/// remotely under the dataset prefix; `reload` is the set of partitions the
/// current run regenerated locally. Only partitions covered by the reload
/// set ever become deletion candidates; the rest of `existing` participates
/// solely in the safety checks that block promotion.
///
/// Either set being empty yields an empty plan: nothing regenerated means
/// nothing to replace, and nothing remote means nothing to delete.
#[must_use]
pub fn plan(existing: &BTreeSet<PartitionKey>, reload: &BTreeSet<PartitionKey>) -> ExclusionPlan {
    let mut plan = ExclusionPlan::default();
    if existing.is_empty() || reload.is_empty() {
        return plan;
    }

    let tenants: BTreeSet<PartitionKey> = reload.iter().filter_map(PartitionKey::tenant).collect();

    if reload.iter().any(PartitionKey::has_date_level) {
        plan_date_hierarchy(&mut plan, existing, reload);
    } else {
        // Tenant-only partitioning: one prefix delete per tenant that has
        // anything remote to replace.
        for tenant in &tenants {
            if existing.iter().any(|e| tenant.covers(e)) {
                plan.insert(TENANT_LEVEL, tenant.clone());
            }
        }
        return plan;
    }

    promote_tenants(&mut plan, existing, &tenants);
    plan
}

/// Collects reload keys at the finest date level, then walks upward one
/// level at a time, promoting a parent whenever every one of its existing
/// children is itself already planned for deletion.
fn plan_date_hierarchy(
    plan: &mut ExclusionPlan,
    existing: &BTreeSet<PartitionKey>,
    reload: &BTreeSet<PartitionKey>,
) {
    let levels = date_levels(reload);

    if let Some(finest) = levels.last().copied() {
        for key in reload {
            // A reload key coarser than the finest level (it has a date
            // segment but no finer children) is a leaf, deleted directly at
            // its own level. Keys with no date segment at all are skipped:
            // a tenant-level prefix delete here could take out dates this
            // run never touched.
            let at = match key.ancestor_at(finest) {
                Some(at) => at,
                None if key.has_date_level() => key.clone(),
                None => continue,
            };
            if existing.iter().any(|e| at.covers(e)) {
                let level = at.level().unwrap_or(finest).to_string();
                plan.insert(&level, at);
            }
        }
    }

    // Walk upward: (Dia -> Mes), then (Mes -> Ano). The combined-date
    // hierarchy has a single level, so promotion goes straight to the
    // tenant pass.
    for pair in levels.windows(2).rev() {
        let (parent_level, child_level) = (pair[0], pair[1]);
        let parents: BTreeSet<PartitionKey> = match plan.level(child_level) {
            Some(keys) => keys.iter().filter_map(|k| k.ancestor_at(parent_level)).collect(),
            None => continue,
        };

        for parent in parents {
            let existing_children: BTreeSet<PartitionKey> = existing
                .iter()
                .filter(|e| parent.covers(e))
                .filter_map(|e| e.ancestor_at(child_level))
                .collect();
            // Compare against the children already *in the plan*, not raw
            // reload ancestors: a child that failed its own promotion (it
            // still holds data this run never regenerated) must block the
            // parent too.
            let planned_children: BTreeSet<PartitionKey> = plan
                .level(child_level)
                .map(|keys| keys.iter().filter(|c| parent.covers(c)).cloned().collect())
                .unwrap_or_default();

            if !existing_children.is_empty() && existing_children == planned_children {
                plan.remove_covered_by(&parent);
                plan.insert(parent_level, parent);
            }
        }
    }
}

/// Promotes a tenant to a single prefix delete when every one of its
/// existing partitions is already covered by the plan. Tenants held back
/// still own remote partitions outside the reload scope and keep their
/// finer-grained exclusions.
fn promote_tenants(
    plan: &mut ExclusionPlan,
    existing: &BTreeSet<PartitionKey>,
    tenants: &BTreeSet<PartitionKey>,
) {
    for tenant in tenants {
        let mut any_existing = false;
        let mut outside = 0usize;
        for key in existing.iter().filter(|e| tenant.covers(e)) {
            any_existing = true;
            if !plan.covers(key) {
                outside += 1;
            }
        }

        if any_existing && outside == 0 {
            plan.remove_covered_by(tenant);
            plan.insert(TENANT_LEVEL, tenant.clone());
        } else if outside > 0 {
            log::info!(
                "Tenant {tenant} kept at finer granularity: {outside} existing partition(s) \
                 fall outside the reload scope"
            );
        }
    }
}

/// The ordered date hierarchy this dataset uses, coarsest first.
fn date_levels(reload: &BTreeSet<PartitionKey>) -> Vec<&'static str> {
    if reload
        .iter()
        .any(|k| k.segment_value(COMBINED_DATE_LEVEL).is_some())
    {
        return vec![COMBINED_DATE_LEVEL];
    }
    let mut levels = vec![YEAR_LEVEL, MONTH_LEVEL];
    if reload.iter().any(|k| k.segment_value(DAY_LEVEL).is_some()) {
        levels.push(DAY_LEVEL);
    }
    levels
}
