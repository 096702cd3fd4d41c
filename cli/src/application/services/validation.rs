//! Application service: setting validation.
//!
//! Runs each setting's rule at most once per distinct value. Remote parts of
//! a rule go through a [`ResourceChecker`]; dependent rules read companion
//! settings from the live config when they run.

use crate::application::ports::{ProgressReporter, ResourceChecker, ResourceError};
use crate::domain::error::{ValidationCause, ValidationError, ValidationErrors};
use crate::domain::rules::{RemoteResource, Rule};
use crate::domain::setting::{FieldReader, Settings};
use crate::domain::DeploymentConfig;

/// Evaluate `rule` for `value`, including any remote existence check.
///
/// # Errors
///
/// Returns the cause of the first failed check.
pub async fn check_rule(
    rule: Rule,
    value: &str,
    fields: &dyn FieldReader,
    checker: &impl ResourceChecker,
) -> Result<(), ValidationCause> {
    let Some(resource) = rule.check(value, fields)? else {
        return Ok(());
    };
    checker
        .check(&resource)
        .await
        .map_err(|e| remote_cause(&resource, e))
}

fn remote_cause(resource: &RemoteResource, err: ResourceError) -> ValidationCause {
    let label = resource.label();
    if let RemoteResource::Image(reference) = resource {
        let v_prefixed = reference
            .rsplit_once(':')
            .is_some_and(|(_, tag)| tag.starts_with('v'));
        let hint = if v_prefixed {
            " (image tags are not prefixed with 'v')"
        } else {
            ""
        };
        return ValidationCause::Remote(format!("{label} not found or not accessible{hint}"));
    }
    match err {
        ResourceError::NotFound => ValidationCause::NotFound(label),
        ResourceError::Malformed => ValidationCause::Malformed(label),
        ResourceError::PermissionDenied => ValidationCause::PermissionDenied(label),
        ResourceError::Other(msg) => ValidationCause::Remote(msg),
    }
}

/// Validate the setting at `idx`, skipping it when its current value
/// already passed.
///
/// # Errors
///
/// Returns a `ValidationError` named after the setting's title. The memo is
/// left untouched on failure so a corrected value is checked again.
pub async fn validate_setting(
    settings: &mut Settings,
    idx: usize,
    checker: &impl ResourceChecker,
) -> Result<(), ValidationError> {
    let Some(setting) = settings.by_index(idx) else {
        return Ok(());
    };
    let Some(rule) = setting.rule else {
        return Ok(());
    };
    if !setting.needs_validation() {
        return Ok(());
    }
    let title = setting.title;
    let value = setting.value.clone();

    check_rule(rule, &value, &*settings, checker)
        .await
        .map_err(|cause| ValidationError::new(title, cause))?;

    tracing::debug!(setting = title, "validated");
    if let Some(setting) = settings.by_index_mut(idx) {
        setting.mark_validated(value);
    }
    Ok(())
}

/// Validate every setting and collect all failures.
///
/// # Errors
///
/// Returns every failing setting, in setting order.
pub async fn validate_all(
    config: &mut DeploymentConfig,
    checker: &impl ResourceChecker,
) -> Result<(), ValidationErrors> {
    let settings = config.settings_mut();
    let mut errors = Vec::new();
    for idx in 0..settings.len() {
        if let Err(e) = validate_setting(settings, idx, checker).await {
            errors.push(e);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Decorates a checker with a progress message per remote lookup.
pub struct ReportingChecker<'a, C, R> {
    inner: &'a C,
    reporter: &'a R,
}

impl<'a, C, R> ReportingChecker<'a, C, R> {
    #[must_use]
    pub fn new(inner: &'a C, reporter: &'a R) -> Self {
        Self { inner, reporter }
    }
}

impl<C: ResourceChecker, R: ProgressReporter> ResourceChecker for ReportingChecker<'_, C, R> {
    async fn check(&self, resource: &RemoteResource) -> Result<(), ResourceError> {
        self.reporter.step(&format!("checking {resource}"));
        self.inner.check(resource).await
    }
}
