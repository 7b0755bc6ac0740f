// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! Access enforcement gateway
//!
//! The single choke point between callers and the decision engine. Two
//! enforcement modes share one `has_permission`:
//!
//! - all-or-nothing: `check`, `require`, `execute`, `authorize_action`;
//! - filtered: `render_view` and `apply_submission`, which drop the fields a
//!   principal may not see or change.
//!
//! Every call of the filtered mode pins the strategy once, so the form-level
//! check and every field-level check read the same policy state.

use crate::actions::WebAction;
use crate::commands::Command;
use crate::entity::ConfigEntity;
use crate::types::{
    CommandOutcome, EnforcementState, ExitCode, FormView, Rejection, RenderedField,
    SubmissionReport,
};
use core_identity::Principal;
use core_policy::{
    AuthorizationStrategy, Decision, EntityType, FieldAuthorizationIndex, PermissionId, Resource,
    Result,
};
use std::fmt;
use std::sync::Arc;

/// Translates decisions into action outcomes and filtered views
#[derive(Clone)]
pub struct AccessGateway {
    strategy: Arc<dyn AuthorizationStrategy>,
    fields: Arc<FieldAuthorizationIndex>,
}

impl fmt::Debug for AccessGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGateway")
            .field("strategy", &self.strategy)
            .field("entities", &self.fields.entity_types().count())
            .finish()
    }
}

impl AccessGateway {
    /// Create a gateway over `strategy` and the field index
    #[must_use]
    pub fn new(
        strategy: Arc<dyn AuthorizationStrategy>,
        fields: Arc<FieldAuthorizationIndex>,
    ) -> Self {
        Self { strategy, fields }
    }

    /// Installed strategy
    #[must_use]
    pub fn strategy(&self) -> &Arc<dyn AuthorizationStrategy> {
        &self.strategy
    }

    /// Field authorization index
    #[must_use]
    pub fn fields(&self) -> &FieldAuthorizationIndex {
        &self.fields
    }

    /// Decide a single check
    ///
    /// # Errors
    ///
    /// Strategy errors (unknown permission, runaway delegation)
    pub fn check(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> Result<Decision> {
        let decision = self.strategy.check(principal, resource, permission)?;
        tracing::debug!(
            principal = %principal,
            resource = %resource.resource_id(),
            %permission,
            ?decision,
            "access decided"
        );
        Ok(decision)
    }

    /// Fail with [`Rejection::Forbidden`] unless the check is granted
    ///
    /// # Errors
    ///
    /// `Forbidden` on denial, `Internal` if the check itself failed
    pub fn require(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        permission: &PermissionId,
    ) -> std::result::Result<(), Rejection> {
        require_with(&*self.strategy, principal, resource, permission)
    }

    /// Run `command` if `principal` holds its permission on `resource`
    ///
    /// A denied command never runs and reports exit code 6 with no policy
    /// detail.
    pub fn execute(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        command: &mut dyn Command,
    ) -> CommandOutcome {
        let name = command.name().to_string();
        tracing::trace!(command = %name, state = ?EnforcementState::Requested, "command received");

        let permission = command.required_permission().clone();
        tracing::trace!(command = %name, state = ?EnforcementState::Evaluating, %permission);
        if let Err(rejection) = self.require(principal, resource, &permission) {
            return CommandOutcome {
                command: name,
                state: EnforcementState::Denied,
                exit_code: rejection.exit_code(),
                message: rejection.to_string(),
            };
        }
        tracing::trace!(command = %name, state = ?EnforcementState::Granted, "running");

        let (exit_code, message) = match command.run() {
            Ok(message) => (ExitCode::Ok, message),
            Err(err) => (err.code, err.message),
        };
        tracing::info!(
            command = %name,
            principal = %principal,
            exit_code = exit_code.code(),
            "command executed"
        );

        CommandOutcome {
            command: name,
            state: EnforcementState::Executed,
            exit_code,
            message,
        }
    }

    /// Gate an HTTP-style action; denial maps to HTTP 403
    ///
    /// # Errors
    ///
    /// See [`require`](Self::require)
    pub fn authorize_action(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        action: WebAction,
    ) -> std::result::Result<(), Rejection> {
        self.require(principal, resource, &action.required_permission())
            .inspect_err(|rejection| {
                tracing::debug!(
                    %action,
                    status = rejection.http_status(),
                    "action rejected"
                );
            })
    }

    /// Filtered view of `entity`: visible fields only, each marked editable or not
    ///
    /// # Errors
    ///
    /// `Forbidden` without the entity's access permission, `Internal` for an
    /// undeclared entity type
    pub fn render_view(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        entity_type: &EntityType,
        entity: &ConfigEntity,
    ) -> std::result::Result<FormView, Rejection> {
        let pinned = self.strategy.pin();
        let policy = self.fields.entity(entity_type)?;
        require_with(&pinned, principal, resource, policy.access_permission())?;

        let access = self
            .fields
            .field_access(&pinned, principal, resource, entity_type)?;

        let fields = policy
            .fields()
            .iter()
            .filter_map(|record| {
                let state = access.get(record.field())?;
                state.is_visible().then(|| RenderedField {
                    field: record.field().clone(),
                    label: record.label().to_string(),
                    value: entity.get(record.field().as_str()).cloned(),
                    editable: state.is_editable(),
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            principal = %principal,
            entity = %entity_type,
            visible = fields.len(),
            declared = policy.fields().len(),
            "view rendered"
        );

        Ok(FormView {
            entity: entity_type.clone(),
            resource: resource.resource_id().clone(),
            fields,
        })
    }

    /// Apply `submitted` to `entity`, keeping only editable fields
    ///
    /// Values for hidden, read-only or undeclared fields are discarded
    /// silently; the outcome is identical to submitting the editable subset
    /// alone. Fields absent from `submitted` keep their current value.
    ///
    /// # Errors
    ///
    /// `Forbidden` without the entity's access permission, `Internal` for an
    /// undeclared entity type. `entity` is untouched on error.
    pub fn apply_submission(
        &self,
        principal: &Principal,
        resource: &dyn Resource,
        entity_type: &EntityType,
        entity: &mut ConfigEntity,
        submitted: &ConfigEntity,
    ) -> std::result::Result<SubmissionReport, Rejection> {
        let pinned = self.strategy.pin();
        let policy = self.fields.entity(entity_type)?;
        require_with(&pinned, principal, resource, policy.access_permission())?;

        let access = self
            .fields
            .field_access(&pinned, principal, resource, entity_type)?;

        let mut report = SubmissionReport::default();
        for (field, value) in submitted.iter() {
            let editable = access.get(field).is_some_and(|state| state.is_editable());
            if editable {
                entity.set(field.clone(), value.clone());
                report.applied.insert(field.clone());
            } else {
                report.discarded.insert(field.clone());
            }
        }

        if !report.discarded.is_empty() {
            tracing::debug!(
                principal = %principal,
                entity = %entity_type,
                discarded = ?report.discarded,
                "submitted values discarded"
            );
        }
        tracing::debug!(
            principal = %principal,
            entity = %entity_type,
            applied = report.applied.len(),
            "submission applied"
        );

        Ok(report)
    }
}

fn require_with<S>(
    strategy: &S,
    principal: &Principal,
    resource: &dyn Resource,
    permission: &PermissionId,
) -> std::result::Result<(), Rejection>
where
    S: AuthorizationStrategy + ?Sized,
{
    match strategy.check(principal, resource, permission)? {
        Decision::Granted => Ok(()),
        Decision::Denied => {
            tracing::warn!(
                principal = %principal,
                resource = %resource.resource_id(),
                "access denied"
            );
            Err(Rejection::Forbidden)
        }
    }
}
