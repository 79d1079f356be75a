use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{OptionValue, PlotterSchema, UpdateStage};
use crate::error::{PlotError, PlotResult};

/// Rendering side effect required after an update batch is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum RenderAction {
    /// Nothing changed; no callback fires.
    #[default]
    None,
    /// Only labeling-stage options changed; the label refresh routine runs.
    RefreshLabels,
    /// A data- or plotting-stage option changed; the visual is dirty and must
    /// be fully replotted.
    Replot,
}

impl RenderAction {
    #[must_use]
    pub const fn max(self, other: Self) -> Self {
        if self as u8 >= other as u8 { self } else { other }
    }
}

/// One scheduled assignment within an [`UpdatePlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStep {
    pub key: String,
    pub value: OptionValue,
    pub stage: UpdateStage,
    /// True when the option is re-applied because a dependency changed (or a
    /// data-stage change forced it), not because its own value differs.
    pub forced: bool,
}

/// Dependency- and stage-ordered application plan for one update batch.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlan {
    pub steps: Vec<UpdateStep>,
    pub action: RenderAction,
}

impl UpdatePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.key.as_str())
    }
}

/// Outcome of an executed update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    /// Keys that were applied, in application order.
    pub applied: Vec<String>,
    pub action: RenderAction,
}

impl UpdateReport {
    #[must_use]
    pub fn no_op() -> Self {
        Self {
            applied: Vec::new(),
            action: RenderAction::None,
        }
    }
}

/// Computes which options to apply, in which order, and what render side
/// effect the batch requires.
///
/// `current` must hold one value per schema key. `force` keys are re-applied
/// with their current value even if nothing changed.
///
/// Rules, in order:
/// 1. unknown batch keys fail with `UnknownOption`; values failing their
///    validator fail with `InvalidValue`;
/// 2. an option is applied when its normalized new value differs from its
///    current value;
/// 3. an option is forced when any of its (transitive) dependencies is
///    applied, and when it is data-dependent and any data-stage option is
///    applied;
/// 4. an option is suppressed when any of its parents is applied in the same
///    batch, regardless of its own value change;
/// 5. surviving options are ordered by stage, then topologically by their
///    children/dependencies edges (declaration order breaks ties).
pub fn plan_update(
    schema: &PlotterSchema,
    current: &IndexMap<String, OptionValue>,
    batch: &IndexMap<String, OptionValue>,
    force: &[String],
) -> PlotResult<UpdatePlan> {
    let len = schema.len();
    let current_at = |idx: usize| {
        current
            .get(schema.key_at(idx))
            .unwrap_or_else(|| schema.spec_at(idx).default_value())
    };

    let mut requested: Vec<Option<OptionValue>> = vec![None; len];
    for (key, value) in batch {
        let idx = schema
            .index_of(key)
            .ok_or_else(|| PlotError::UnknownOption { key: key.clone() })?;
        let spec = schema.spec_at(idx);
        let normalized = spec.validator().normalize(value);
        spec.validator()
            .check(&normalized)
            .map_err(|expected| PlotError::InvalidValue {
                key: key.clone(),
                expected,
                got: value.to_string(),
            })?;
        requested[idx] = Some(normalized);
    }

    let mut applied = vec![false; len];
    let mut forced = vec![false; len];
    for key in force {
        let idx = schema
            .index_of(key)
            .ok_or_else(|| PlotError::UnknownOption { key: key.clone() })?;
        applied[idx] = true;
        forced[idx] = true;
    }
    for (idx, value) in requested.iter().enumerate() {
        if let Some(value) = value
            && value != current_at(idx)
        {
            applied[idx] = true;
        }
    }

    // Dependency forcing and data-dependence can cascade; iterate to fixpoint.
    loop {
        let mut grew = false;
        for idx in 0..len {
            if !applied[idx]
                && schema
                    .deep_dependencies_of(idx)
                    .iter()
                    .any(|&dep| applied[dep])
            {
                applied[idx] = true;
                forced[idx] = true;
                grew = true;
            }
        }
        let data_changed =
            (0..len).any(|idx| applied[idx] && schema.spec_at(idx).stage() == UpdateStage::Data);
        if data_changed {
            for idx in 0..len {
                if !applied[idx] && schema.spec_at(idx).data_dependent() {
                    applied[idx] = true;
                    forced[idx] = true;
                    grew = true;
                }
            }
        }
        if !grew {
            break;
        }
    }

    // Parent suppression runs against the pre-suppression applied set: a
    // parent that is itself suppressed still suppresses its children.
    let before_suppression = applied.clone();
    for idx in 0..len {
        if applied[idx]
            && schema
                .parents_of(idx)
                .iter()
                .any(|&parent| before_suppression[parent])
        {
            applied[idx] = false;
            debug!(
                key = schema.key_at(idx),
                "update suppressed by parent change"
            );
        }
    }

    // Kahn's algorithm over the applied set. Stage then declaration order
    // breaks ties; schema construction guarantees acyclicity and that no
    // child/dependency lives in a later stage, so every applied option is
    // eventually emitted and stages never interleave.
    let mut blockers = vec![0usize; len];
    for idx in 0..len {
        if !applied[idx] {
            continue;
        }
        // A key may appear as both child and dependency; count it once so
        // the decrement from the single reverse edge releases the blocker.
        let mut before: Vec<usize> = schema
            .children_of(idx)
            .iter()
            .chain(schema.dependencies_of(idx))
            .copied()
            .filter(|&before| applied[before])
            .collect();
        before.sort_unstable();
        before.dedup();
        blockers[idx] = before.len();
    }
    let mut ready: BTreeSet<(UpdateStage, usize)> = (0..len)
        .filter(|&idx| applied[idx] && blockers[idx] == 0)
        .map(|idx| (schema.spec_at(idx).stage(), idx))
        .collect();

    let mut requested = requested;
    let mut steps = Vec::new();
    let mut action = RenderAction::None;
    while let Some(&(stage, idx)) = ready.iter().next() {
        ready.remove(&(stage, idx));
        let spec = schema.spec_at(idx);
        let value = match requested[idx].take() {
            Some(value) => value,
            None => current_at(idx).clone(),
        };
        let step_action = if stage.requires_replot() || spec.triggers_replot() {
            RenderAction::Replot
        } else {
            RenderAction::RefreshLabels
        };
        action = action.max(step_action);
        steps.push(UpdateStep {
            key: spec.key().to_owned(),
            value,
            stage,
            forced: forced[idx],
        });
        for &dependent in schema.dependents_of(idx) {
            if applied[dependent] {
                blockers[dependent] -= 1;
                if blockers[dependent] == 0 {
                    ready.insert((schema.spec_at(dependent).stage(), dependent));
                }
            }
        }
    }

    if !steps.is_empty() {
        debug!(
            keys = ?steps.iter().map(|step| step.key.as_str()).collect::<Vec<_>>(),
            ?action,
            "scheduled formatoption updates"
        );
    }
    Ok(UpdatePlan { steps, action })
}
