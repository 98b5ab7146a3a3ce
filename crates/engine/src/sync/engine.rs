//! Bridge between the form controller and the shared session state.
//!
//! Two triggers drive the engine:
//!
//! - **Provider switch**: [`SyncEngine::begin_switch`] captures the active
//!   provider in a [`SwitchTicket`]; the catalog is fetched outside the engine
//!   and handed back through [`SyncEngine::apply_catalog`]. Only the ticket of
//!   the latest switch is honored, so a slow earlier fetch can never clobber a
//!   later one.
//! - **Field edit**: [`SyncEngine::edit`] forwards to the form and writes the
//!   resulting snapshot into the session as a whole-set replacement.
//!
//! Recoverable failures never escape as errors; they are queued as
//! [`PanelSignal`]s for the host to render.

use knobs_types::{ProviderDescriptor, ValueSet};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    catalog::{CatalogSource, CatalogSourceError},
    form::{FormController, FormError, FormEvent},
    resolve::resolve_settings_with_report,
    schema::{FieldStatus, ValidationReport, build_schema},
    session::SessionHandle,
    sync::{CatalogResolutionError, PanelSignal, ProviderSelector, SelectorError, SwitchOutcome, SwitchTicket},
};

/// Keeps the form and the shared session consistent across edits and provider switches.
#[derive(Debug)]
pub struct SyncEngine {
    session: SessionHandle,
    selector: ProviderSelector,
    form: FormController,
    displayed: Option<ProviderDescriptor>,
    generation: u64,
    pending: Option<SwitchTicket>,
    signals: Vec<PanelSignal>,
}

impl SyncEngine {
    pub fn new(session: SessionHandle, selector: ProviderSelector) -> Self {
        Self {
            session,
            selector,
            form: FormController::new(),
            displayed: None,
            generation: 0,
            pending: None,
            signals: Vec::new(),
        }
    }

    /// Read handle to the shared session state.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    /// Read-only view of the live form.
    pub fn form(&self) -> &FormController {
        &self.form
    }

    /// Descriptor of the provider whose panel is currently displayed.
    pub fn displayed_provider(&self) -> Option<&ProviderDescriptor> {
        self.displayed.as_ref()
    }

    /// The switch still waiting for its catalog, if any.
    pub fn pending_switch(&self) -> Option<&SwitchTicket> {
        self.pending.as_ref()
    }

    /// Drains the signals queued since the last call.
    pub fn take_signals(&mut self) -> Vec<PanelSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Selects `provider_id` through the selector and starts a switch unless
    /// that provider is already displayed or already being fetched.
    ///
    /// Re-selecting a provider whose catalog failed to load starts a new switch.
    pub fn select_provider(&mut self, provider_id: &str) -> Result<Option<SwitchTicket>, SelectorError> {
        let changed = self.selector.select(&self.session, provider_id)?;
        let displayed = self
            .displayed
            .as_ref()
            .is_some_and(|descriptor| descriptor.provider_id == provider_id);
        let in_flight = self
            .pending
            .as_ref()
            .is_some_and(|ticket| ticket.provider_id == provider_id);
        if changed || !(displayed || in_flight) {
            Ok(Some(self.begin_switch()))
        } else {
            debug!(provider_id = %provider_id, "provider already displayed or loading");
            Ok(None)
        }
    }

    /// Starts a switch to the session's active provider.
    ///
    /// An unknown active provider is replaced by the default provider first.
    /// Any switch started earlier becomes stale.
    pub fn begin_switch(&mut self) -> SwitchTicket {
        if let Some(substitution) = self.selector.substitute_unknown(&self.session) {
            self.signals.push(PanelSignal::ProviderSubstituted {
                missing: substitution.missing,
                substitute: substitution.substitute.provider_id,
                substitute_name: substitution.substitute.display_name,
            });
        }

        self.generation += 1;
        let ticket = SwitchTicket {
            generation: self.generation,
            provider_id: self.session.snapshot().active_provider_id().to_string(),
        };
        if let Some(previous) = self.pending.replace(ticket.clone()) {
            debug!(superseded = %previous.provider_id, generation = previous.generation, "provider switch superseded");
        }
        info!(provider_id = %ticket.provider_id, generation = ticket.generation, "provider switch started");
        ticket
    }

    /// Applies the catalog fetched for `ticket`.
    ///
    /// Stale tickets and failed fetches leave the form and session untouched.
    pub fn apply_catalog(&mut self, ticket: SwitchTicket, result: Result<ProviderDescriptor, CatalogSourceError>) -> SwitchOutcome {
        if self.pending.as_ref() != Some(&ticket) {
            warn!(provider_id = %ticket.provider_id, generation = ticket.generation, "discarding stale catalog result");
            self.signals.push(PanelSignal::StaleResultDiscarded {
                provider_id: ticket.provider_id.clone(),
            });
            return SwitchOutcome::Stale { ticket };
        }
        self.pending = None;

        let descriptor = match result {
            Ok(descriptor) if descriptor.provider_id == ticket.provider_id => descriptor,
            Ok(descriptor) => {
                let reason = format!("source returned provider '{}'", descriptor.provider_id);
                return self.fail_switch(ticket, CatalogSourceError::malformed(descriptor.provider_id, reason));
            }
            Err(error) => return self.fail_switch(ticket, error),
        };

        let snapshot = self.session.snapshot();
        let report = resolve_settings_with_report(&descriptor.parameters, snapshot.current_values(), snapshot.original_values());
        let schema = build_schema(&descriptor.parameters);
        let event = self.form.seed(&descriptor.parameters, schema, report.values.clone());
        self.apply_form_event(event);

        info!(
            provider_id = %descriptor.provider_id,
            field_count = descriptor.parameters.len(),
            seeded = report.values.len(),
            dropped = report.incompatible.len(),
            "panel reseeded"
        );
        self.signals.push(PanelSignal::Reseeded {
            provider_id: descriptor.provider_id.clone(),
            values: self.form.values().clone(),
        });
        self.displayed = Some(descriptor);
        SwitchOutcome::Applied { ticket, report }
    }

    /// Runs a whole switch inline: begin, fetch from `source`, apply.
    pub async fn switch_with(&mut self, source: &dyn CatalogSource) -> SwitchOutcome {
        let ticket = self.begin_switch();
        let result = source.fetch(&ticket.provider_id).await;
        self.apply_catalog(ticket, result)
    }

    /// Writes `value` into the form and propagates the full value set to the session.
    pub fn edit(&mut self, id: &str, value: Value, validate_immediately: bool) -> Result<FieldStatus, FormError> {
        let event = self.form.set_value(id, value, validate_immediately)?;
        self.apply_form_event(event);
        Ok(self.form.status(id).cloned().unwrap_or(FieldStatus::Valid))
    }

    /// Clears `id` and propagates the full value set to the session.
    pub fn clear(&mut self, id: &str) -> Result<(), FormError> {
        let event = self.form.clear_value(id)?;
        self.apply_form_event(event);
        Ok(())
    }

    /// Runs a full validation pass over the live form.
    pub fn validate_all(&mut self) -> ValidationReport {
        self.form.validate_all()
    }

    fn apply_form_event(&self, event: FormEvent) {
        match event {
            FormEvent::ValuesChanged(values) => self.replace_current_values(values),
        }
    }

    fn replace_current_values(&self, values: ValueSet) {
        let snapshot = self.session.snapshot();
        self.session.replace(snapshot.with_current_values(values));
    }

    fn fail_switch(&mut self, ticket: SwitchTicket, error: CatalogSourceError) -> SwitchOutcome {
        warn!(provider_id = %ticket.provider_id, error = %error, "catalog resolution failed; keeping current panel");
        let error = CatalogResolutionError {
            provider_id: ticket.provider_id.clone(),
            source: error,
        };
        self.signals.push(PanelSignal::CatalogUnavailable {
            provider_id: ticket.provider_id.clone(),
            reason: error.to_string(),
        });
        SwitchOutcome::Failed { ticket, error }
    }
}
