//! Layer partial descriptions into one
//!
//! Precedence is base < overlays (in order) < explicit variables. Scalars
//! are replaced by later non-empty values, maps are shallow-merged and
//! component lists are appended. Duplicate component ids produced by
//! appending are left for the validator to report.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::schema::RawApplication;

pub fn merge(
    base: RawApplication,
    overlays: &[RawApplication],
    variables: &BTreeMap<String, String>,
) -> RawApplication {
    let mut merged = base;
    for (index, overlay) in overlays.iter().enumerate() {
        debug!("Applying overlay {}", index);
        apply(&mut merged, overlay);
    }
    for (name, value) in variables {
        merged
            .variables
            .insert(name.clone(), Value::String(value.clone()));
    }
    merged
}

fn override_scalar(target: &mut Option<String>, incoming: Option<&String>) {
    if let Some(value) = incoming.filter(|v| !v.trim().is_empty()) {
        *target = Some(value.clone());
    }
}

fn apply(target: &mut RawApplication, overlay: &RawApplication) {
    override_scalar(&mut target.name, overlay.name.as_ref());
    override_scalar(&mut target.version, overlay.version.as_ref());
    override_scalar(&mut target.description, overlay.description.as_ref());
    override_scalar(&mut target.access, overlay.access.as_ref());

    if overlay.auth.is_some() {
        target.auth.clone_from(&overlay.auth);
    }
    if !overlay.allowed_subjects.is_empty() {
        target.allowed_subjects.clone_from(&overlay.allowed_subjects);
    }

    for (name, value) in &overlay.required_claims {
        target.required_claims.insert(name.clone(), value.clone());
    }
    for (name, value) in &overlay.variables {
        target.variables.insert(name.clone(), value.clone());
    }
    for (name, value) in &overlay.extra {
        target.extra.insert(name.clone(), value.clone());
    }

    target.components.extend(overlay.components.iter().cloned());
}
