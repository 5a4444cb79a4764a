//! Host adapter for a single bound control.
//!
//! The host calls into the session whenever its inputs change. A cycle has
//! three phases so that fetches from overlapping cycles can be awaited
//! independently:
//!
//! 1. [`ControlSession::start_cycle`] materializes the query and issues a ticket.
//! 2. [`PendingCycle::fetch`] (or [`PendingCycle::complete`] for host-driven
//!    transports) produces the fetch outcome.
//! 3. [`ControlSession::complete_cycle`] reconciles, applies side effects to
//!    the host binding, and returns the render state.
//!
//! Results are applied last-result-wins: a completion whose ticket is older
//! than the last applied one is discarded.

use picklist_types::{BindingMode, BoundValue, FieldSecurity, ParameterSet, Record, RenderState, SelectionEvent};
use tracing::{debug, info, warn};

use crate::codec::decode_event;
use crate::config::ControlConfig;
use crate::error::{ConfigurationError, EngineError, FetchError};
use crate::mapping::OptionMapper;
use crate::provider::RecordFetcher;
use crate::query::QueryTemplate;
use crate::reconcile::{CycleState, SelectionReconciler};
use crate::templates::FieldTemplate;

/// Value binding owned by the host.
pub trait HostBinding {
    fn bound_value(&self) -> BoundValue;
    fn set_bound_value(&mut self, value: BoundValue);
    /// Tell the host that the control produced a new output value.
    fn notify_changed(&mut self);
}

/// Per-cycle inputs delivered by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewInput {
    pub parameters: ParameterSet,
    pub control_disabled: bool,
    /// Field-level security; `None` means no restrictions.
    pub security: Option<FieldSecurity>,
}

impl ViewInput {
    fn disabled(&self) -> bool {
        self.control_disabled || self.security.is_some_and(|security| !security.editable)
    }

    fn masked(&self) -> bool {
        self.security.is_some_and(|security| !security.readable)
    }
}

/// A started cycle waiting for its fetch outcome.
#[derive(Debug)]
pub struct PendingCycle {
    ticket: u64,
    entity_type: String,
    query: Result<String, ConfigurationError>,
    disabled: bool,
    masked: bool,
}

impl PendingCycle {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The materialized query, or the configuration error that prevents fetching.
    pub fn query(&self) -> Result<&str, &ConfigurationError> {
        self.query.as_deref()
    }

    /// Attach an outcome produced outside the engine.
    ///
    /// A cycle whose query failed to build keeps its configuration error
    /// regardless of `outcome`.
    pub fn complete(self, outcome: Result<Vec<Record>, FetchError>) -> CompletedCycle {
        let outcome = match self.query {
            Ok(_) => outcome.map_err(EngineError::from),
            Err(error) => Err(error.into()),
        };
        CompletedCycle {
            ticket: self.ticket,
            outcome,
            disabled: self.disabled,
            masked: self.masked,
        }
    }

    /// Run the fetch through `fetcher`. No request is made when the query is invalid.
    pub async fn fetch<F>(self, fetcher: &F) -> CompletedCycle
    where
        F: RecordFetcher + ?Sized,
    {
        let outcome = match &self.query {
            Ok(query) => fetcher.fetch_records(&self.entity_type, query).await,
            Err(_) => Ok(Vec::new()),
        };
        self.complete(outcome)
    }
}

/// A cycle whose fetch has finished.
#[derive(Debug)]
pub struct CompletedCycle {
    ticket: u64,
    outcome: Result<Vec<Record>, EngineError>,
    disabled: bool,
    masked: bool,
}

impl CompletedCycle {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

/// Engine state for one control bound to one host field.
#[derive(Debug)]
pub struct ControlSession {
    entity_type: String,
    query: Option<QueryTemplate>,
    mapper: Result<OptionMapper, ConfigurationError>,
    binding: BindingMode,
    issued_tickets: u64,
    applied_ticket: u64,
    cycle_state: CycleState,
}

impl ControlSession {
    /// Compile a session from static configuration.
    ///
    /// Never fails: configuration problems surface as each cycle's error message.
    pub fn new(config: &ControlConfig) -> Self {
        let query = (!config.query.trim().is_empty()).then(|| QueryTemplate::parse(&config.query));
        let mapper = OptionMapper::new(
            FieldTemplate::parse_optional(config.key_field.as_deref()),
            FieldTemplate::parse_optional(config.text_field.as_deref()),
        );
        Self {
            entity_type: config.entity_type.trim().to_string(),
            query,
            mapper,
            binding: config.binding.clone(),
            issued_tickets: 0,
            applied_ticket: 0,
            cycle_state: CycleState::Pending,
        }
    }

    pub fn binding_mode(&self) -> &BindingMode {
        &self.binding
    }

    /// State reached by the most recently applied cycle.
    pub fn cycle_state(&self) -> &CycleState {
        &self.cycle_state
    }

    /// Begin a cycle for `input`.
    pub fn start_cycle(&mut self, input: &ViewInput) -> PendingCycle {
        self.issued_tickets += 1;
        let query = self.materialize_query(&input.parameters);
        debug!(
            ticket = self.issued_tickets,
            entity_type = %self.entity_type,
            query_ok = query.is_ok(),
            "cycle started"
        );
        PendingCycle {
            ticket: self.issued_tickets,
            entity_type: self.entity_type.clone(),
            query,
            disabled: input.disabled(),
            masked: input.masked(),
        }
    }

    /// Apply a finished cycle to `host`.
    ///
    /// Returns `None` when a newer cycle has already been applied. Otherwise
    /// the bound value is cleared (and the host notified) if it no longer
    /// matches any fetched option.
    pub fn complete_cycle<H>(&mut self, completed: CompletedCycle, host: &mut H) -> Option<RenderState>
    where
        H: HostBinding + ?Sized,
    {
        if completed.ticket <= self.applied_ticket {
            warn!(
                ticket = completed.ticket,
                applied_ticket = self.applied_ticket,
                "discarding stale fetch result"
            );
            return None;
        }
        self.applied_ticket = completed.ticket;

        let mut render = RenderState {
            disabled: completed.disabled,
            masked: completed.masked,
            ..RenderState::default()
        };

        let records = match completed.outcome {
            Ok(records) => records,
            Err(error) => {
                warn!(ticket = completed.ticket, error = %error, "cycle failed");
                self.cycle_state = CycleState::Pending;
                render.error_message = Some(error.to_string());
                return Some(render);
            }
        };

        let mapper = match &self.mapper {
            Ok(mapper) => mapper,
            Err(error) => {
                warn!(ticket = completed.ticket, error = %error, "cycle failed");
                self.cycle_state = CycleState::Pending;
                render.error_message = Some(error.to_string());
                return Some(render);
            }
        };

        let bound = host.bound_value();
        let mut reconciler = SelectionReconciler::new();
        let result = reconciler.run(&bound, &records, mapper);
        self.cycle_state = reconciler.state().clone();

        if result.should_clear_bound_value {
            info!(ticket = completed.ticket, "bound value no longer in result set; clearing");
            host.set_bound_value(BoundValue::Empty);
            host.notify_changed();
        }

        render.options = result.options;
        render.selected_key = result.selected_key;
        Some(render)
    }

    /// Run a full cycle against `fetcher`.
    pub async fn update_view<F, H>(&mut self, input: &ViewInput, fetcher: &F, host: &mut H) -> Option<RenderState>
    where
        F: RecordFetcher + ?Sized,
        H: HostBinding + ?Sized,
    {
        let pending = self.start_cycle(input);
        let completed = pending.fetch(fetcher).await;
        self.complete_cycle(completed, host)
    }

    /// Commit a user selection to `host` and notify it.
    pub fn select<H>(&self, event: &SelectionEvent, host: &mut H) -> BoundValue
    where
        H: HostBinding + ?Sized,
    {
        let value = decode_event(event, &self.binding);
        debug!(event = ?event, "selection committed");
        host.set_bound_value(value.clone());
        host.notify_changed();
        value
    }

    fn materialize_query(&self, parameters: &ParameterSet) -> Result<String, ConfigurationError> {
        if self.entity_type.is_empty() {
            return Err(ConfigurationError::MissingEntityType);
        }
        let template = self.query.as_ref().ok_or(ConfigurationError::MissingQuery)?;
        template.build(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picklist_types::{OptionEntry, Parameter};
    use serde_json::json;

    #[derive(Debug, Default)]
    struct RecordingHost {
        value: BoundValue,
        notifications: usize,
    }

    impl HostBinding for RecordingHost {
        fn bound_value(&self) -> BoundValue {
            self.value.clone()
        }

        fn set_bound_value(&mut self, value: BoundValue) {
            self.value = value;
        }

        fn notify_changed(&mut self) {
            self.notifications += 1;
        }
    }

    fn config() -> ControlConfig {
        ControlConfig {
            entity_type: "account".into(),
            query: "?$filter=statecode eq ${1}".into(),
            key_field: Some("id".into()),
            text_field: Some("name".into()),
            binding: BindingMode::Scalar,
        }
    }

    fn input() -> ViewInput {
        ViewInput {
            parameters: ParameterSet::new().with(1, Parameter::scalar(0)).expect("slot"),
            ..ViewInput::default()
        }
    }

    fn records() -> Vec<Record> {
        vec![
            Record::from_json(json!({"id": "1", "name": "A"})).expect("record"),
            Record::from_json(json!({"id": "2", "name": "B"})).expect("record"),
        ]
    }

    #[test]
    fn start_cycle_materializes_query() {
        let mut session = ControlSession::new(&config());
        let pending = session.start_cycle(&input());
        assert_eq!(pending.ticket(), 1);
        assert_eq!(pending.entity_type(), "account");
        assert_eq!(pending.query(), Ok("?$filter=statecode eq 0"));
    }

    #[test]
    fn blank_entity_type_or_query_is_configuration_error() {
        let mut session = ControlSession::new(&ControlConfig {
            entity_type: " ".into(),
            ..config()
        });
        assert_eq!(session.start_cycle(&input()).query(), Err(&ConfigurationError::MissingEntityType));

        let mut session = ControlSession::new(&ControlConfig {
            query: String::new(),
            ..config()
        });
        assert_eq!(session.start_cycle(&input()).query(), Err(&ConfigurationError::MissingQuery));
    }

    #[test]
    fn matching_cycle_keeps_bound_value() {
        let mut session = ControlSession::new(&config());
        let mut host = RecordingHost {
            value: BoundValue::Scalar(json!("2")),
            ..RecordingHost::default()
        };
        let completed = session.start_cycle(&input()).complete(Ok(records()));
        let render = session.complete_cycle(completed, &mut host).expect("applied");
        assert_eq!(render.selected_key.as_deref(), Some("2"));
        assert_eq!(render.options, vec![OptionEntry::new("1", "A"), OptionEntry::new("2", "B")]);
        assert_eq!(render.error_message, None);
        assert_eq!(host.notifications, 0);
        assert_eq!(session.cycle_state(), &CycleState::Matched("2".into()));
    }

    #[test]
    fn unmatched_cycle_clears_and_notifies() {
        let mut session = ControlSession::new(&config());
        let mut host = RecordingHost {
            value: BoundValue::Scalar(json!("9")),
            ..RecordingHost::default()
        };
        let completed = session.start_cycle(&input()).complete(Ok(records()));
        let render = session.complete_cycle(completed, &mut host).expect("applied");
        assert_eq!(render.selected_key, None);
        assert_eq!(host.value, BoundValue::Empty);
        assert_eq!(host.notifications, 1);
        assert_eq!(session.cycle_state(), &CycleState::NotFound);
    }

    #[test]
    fn null_scalar_binding_is_never_cleared() {
        let mut session = ControlSession::new(&config());
        let mut host = RecordingHost {
            value: BoundValue::Scalar(serde_json::Value::Null),
            ..RecordingHost::default()
        };
        for _ in 0..2 {
            let completed = session.start_cycle(&input()).complete(Ok(records()));
            let render = session.complete_cycle(completed, &mut host).expect("applied");
            assert_eq!(render.selected_key, None);
        }
        assert_eq!(host.value, BoundValue::Scalar(serde_json::Value::Null));
        assert_eq!(host.notifications, 0);
        assert_eq!(session.cycle_state(), &CycleState::Resolved);
    }

    #[test]
    fn fetch_error_leaves_selection_untouched() {
        let mut session = ControlSession::new(&config());
        let mut host = RecordingHost {
            value: BoundValue::Scalar(json!("9")),
            ..RecordingHost::default()
        };
        let completed = session.start_cycle(&input()).complete(Err(FetchError::new("network down")));
        let render = session.complete_cycle(completed, &mut host).expect("applied");
        assert!(render.options.is_empty());
        assert_eq!(render.error_message.as_deref(), Some("network down"));
        assert_eq!(host.value, BoundValue::Scalar(json!("9")));
        assert_eq!(host.notifications, 0);
    }

    #[test]
    fn missing_template_surfaces_as_error_message() {
        let mut session = ControlSession::new(&ControlConfig {
            text_field: None,
            ..config()
        });
        let mut host = RecordingHost::default();
        let completed = session.start_cycle(&input()).complete(Ok(records()));
        let render = session.complete_cycle(completed, &mut host).expect("applied");
        assert!(render.options.is_empty());
        assert_eq!(render.error_message.as_deref(), Some("Value field or text field are not set."));
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut session = ControlSession::new(&config());
        let mut host = RecordingHost {
            value: BoundValue::Scalar(json!("1")),
            ..RecordingHost::default()
        };
        let first = session.start_cycle(&input());
        let second = session.start_cycle(&input());

        let newer = second.complete(Ok(records()));
        assert!(session.complete_cycle(newer, &mut host).is_some());

        let older = first.complete(Ok(Vec::new()));
        assert_eq!(session.complete_cycle(older, &mut host), None);
        assert_eq!(host.value, BoundValue::Scalar(json!("1")));
        assert_eq!(host.notifications, 0);
    }

    #[test]
    fn security_drives_disabled_and_masked() {
        let mut session = ControlSession::new(&config());
        let mut host = RecordingHost::default();
        let restricted = ViewInput {
            security: Some(FieldSecurity {
                editable: false,
                readable: false,
            }),
            ..input()
        };
        let completed = session.start_cycle(&restricted).complete(Ok(records()));
        let render = session.complete_cycle(completed, &mut host).expect("applied");
        assert!(render.disabled);
        assert!(render.masked);

        let disabled_only = ViewInput {
            control_disabled: true,
            ..input()
        };
        let completed = session.start_cycle(&disabled_only).complete(Ok(records()));
        let render = session.complete_cycle(completed, &mut host).expect("applied");
        assert!(render.disabled);
        assert!(!render.masked);
    }

    #[test]
    fn select_writes_reference_and_notifies() {
        let session = ControlSession::new(&ControlConfig {
            binding: BindingMode::Reference {
                target_entity_type: "account".into(),
            },
            ..config()
        });
        let mut host = RecordingHost::default();
        let value = session.select(
            &SelectionEvent::Selected {
                key: "2".into(),
                text: "B".into(),
            },
            &mut host,
        );
        assert!(matches!(&value, BoundValue::Reference(reference) if reference.id == "2" && reference.entity_type == "account"));
        assert_eq!(host.value, value);
        assert_eq!(host.notifications, 1);

        session.select(&SelectionEvent::Cleared, &mut host);
        assert_eq!(host.value, BoundValue::Empty);
        assert_eq!(host.notifications, 2);
    }
}
