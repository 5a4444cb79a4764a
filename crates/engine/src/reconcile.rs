//! Selection reconciliation.
//!
//! After every fetch the option list is rebuilt and the bound value is checked
//! against it. A bound value whose record disappeared from the result set must
//! be cleared by the caller; the reconciler only reports that decision.

use std::collections::HashSet;

use picklist_types::{BoundValue, OptionEntry, ReconciliationResult, Record};
use tracing::{debug, warn};

use crate::codec::current_key;
use crate::error::ConfigurationError;
use crate::mapping::OptionMapper;
use crate::templates::FieldTemplate;

/// Progress of a single reconciliation cycle.
///
/// `Pending` until options exist, then `Resolved`. `Resolved` is final when
/// nothing is bound; otherwise the scan ends in `Matched` or `NotFound`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CycleState {
    #[default]
    Pending,
    Resolved,
    Matched(String),
    NotFound,
}

impl CycleState {
    fn resolve(self) -> Self {
        match self {
            CycleState::Pending => CycleState::Resolved,
            other => other,
        }
    }

    /// First-match scan. Once matched, later options are never compared.
    fn scan(self, options: &[OptionEntry], target: &str) -> Self {
        if self != CycleState::Resolved {
            return self;
        }
        let mut state = self;
        for option in options {
            if matches!(state, CycleState::Matched(_)) {
                break;
            }
            if option.key == target {
                state = CycleState::Matched(option.key.clone());
            }
        }
        match state {
            CycleState::Resolved => CycleState::NotFound,
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CycleState::Pending)
    }
}

/// Drives one cycle from fetched records to a [`ReconciliationResult`].
#[derive(Debug, Default)]
pub struct SelectionReconciler {
    state: CycleState,
}

impl SelectionReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Map `records` and match `bound` against the result.
    pub fn run(&mut self, bound: &BoundValue, records: &[Record], mapper: &OptionMapper) -> ReconciliationResult {
        self.state = CycleState::Pending;
        let options = mapper.map(records);
        let duplicate_keys = duplicate_keys(&options);
        if !duplicate_keys.is_empty() {
            warn!(
                duplicates = ?duplicate_keys,
                "fetched options contain duplicate keys; only the first occurrence is selectable"
            );
        }
        self.state = std::mem::take(&mut self.state).resolve();

        let Some(target) = current_key(bound) else {
            debug!(option_count = options.len(), "no bound value; skipping match");
            return ReconciliationResult {
                options,
                selected_key: None,
                should_clear_bound_value: false,
                duplicate_keys,
            };
        };

        self.state = std::mem::take(&mut self.state).scan(&options, &target);
        let (selected_key, should_clear_bound_value) = match &self.state {
            CycleState::Matched(key) => (Some(key.clone()), false),
            _ => (None, true),
        };
        debug!(
            option_count = options.len(),
            target = %target,
            matched = selected_key.is_some(),
            "reconciled bound value"
        );

        ReconciliationResult {
            options,
            selected_key,
            should_clear_bound_value,
            duplicate_keys,
        }
    }
}

/// Reconcile `bound` against `records` using the two field templates.
///
/// An unset template fails the cycle before any matching happens, even when
/// nothing is bound.
pub fn reconcile(
    bound: &BoundValue,
    records: &[Record],
    key: Option<&FieldTemplate>,
    text: Option<&FieldTemplate>,
) -> Result<ReconciliationResult, ConfigurationError> {
    let mapper = OptionMapper::new(key.cloned(), text.cloned())?;
    Ok(SelectionReconciler::new().run(bound, records, &mapper))
}

fn duplicate_keys(options: &[OptionEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for option in options {
        if !seen.insert(option.key.as_str()) && !duplicates.contains(&option.key) {
            duplicates.push(option.key.clone());
        }
    }
    duplicates
}
