//! Create-or-patch engine with dry-run support and secret redaction.
//!
//! Every write produces exactly one human-readable line. Lines are built only
//! after the store round trip succeeded, and any payload they show has passed
//! through [`redact`] first.

use crate::cancel::cancellable;
use crate::error::ToolError;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use kube::api::{DynamicObject, GroupVersionKind};
use serde_json::{Map, Value};
use store_client::{ObjectKey, StoreClient, WriteOptions, gvk_of};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Placeholder shown instead of secret values
pub const REDACTED: &str = "<redacted>";

/// Prefix of every line describing a simulated write
pub const DRY_RUN_PREFIX: &str = "(Dry Run)";

/// Prefix of every line describing a persisted write
pub const APPLIED_PREFIX: &str = "✅";

/// Top-level payload keys never compared or patched; of `metadata` only
/// labels and annotations are
const IGNORED_KEYS: &[&str] = &["apiVersion", "kind", "metadata", "status"];

/// What create-or-patch did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The object did not exist and was created
    Created,
    /// The object existed with different payload and was patched
    Patched,
    /// The object already matched; nothing was written
    UpToDate,
}

fn is_core_secret(gvk: &GroupVersionKind) -> bool {
    gvk.group.is_empty() && gvk.kind == "Secret"
}

/// Payload fields whose values are secret for objects of kind `gvk`
fn secret_fields(gvk: &GroupVersionKind) -> &'static [&'static str] {
    if is_core_secret(gvk) { &["data", "stringData"] } else { &[] }
}

fn mask_values(field: &mut Value) {
    match field {
        Value::Object(entries) => {
            for value in entries.values_mut() {
                if !value.is_null() {
                    *value = Value::String(REDACTED.to_string());
                }
            }
        }
        Value::Null => {}
        value => *value = Value::String(REDACTED.to_string()),
    }
}

/// Copy of `payload` with every secret value replaced by [`REDACTED`]
///
/// Keys stay visible; values removed by a patch (`null`) stay `null`.
/// Annotations of secrets are masked too, since tooling such as
/// `last-applied-configuration` copies the whole object into them.
pub fn redact(gvk: &GroupVersionKind, payload: &Value) -> Value {
    let mut redacted = payload.clone();
    for field in secret_fields(gvk) {
        if let Some(value) = redacted.get_mut(*field) {
            mask_values(value);
        }
    }
    if is_core_secret(gvk) {
        if let Some(annotations) = redacted.pointer_mut("/metadata/annotations") {
            mask_values(annotations);
        }
    }
    redacted
}

/// Fold `stringData` into `data` the way the API server stores it
fn fold_string_data(view: &mut Map<String, Value>) {
    let Some(Value::Object(string_data)) = view.remove("stringData") else {
        return;
    };
    let data = view.entry("data").or_insert(Value::Null);
    if !data.is_object() {
        *data = Value::Object(Map::new());
    }
    if let Value::Object(data) = data {
        for (key, value) in string_data {
            let encoded = match value {
                Value::String(text) => Value::String(BASE64_STANDARD.encode(text)),
                other => other,
            };
            data.insert(key, encoded);
        }
    }
}

/// The comparable part of an object: payload plus caller-owned metadata
fn comparable_view(obj: &DynamicObject) -> Value {
    let mut view = Map::new();
    if let Value::Object(data) = &obj.data {
        for (key, value) in data {
            if !IGNORED_KEYS.contains(&key.as_str()) {
                view.insert(key.clone(), value.clone());
            }
        }
    }

    let mut metadata = Map::new();
    if let Some(labels) = &obj.metadata.labels {
        metadata.insert("labels".to_string(), serde_json::json!(labels));
    }
    if let Some(annotations) = &obj.metadata.annotations {
        metadata.insert("annotations".to_string(), serde_json::json!(annotations));
    }
    if !metadata.is_empty() {
        view.insert("metadata".to_string(), Value::Object(metadata));
    }
    if gvk_of(obj).is_ok_and(|gvk| is_core_secret(&gvk)) {
        fold_string_data(&mut view);
    }
    Value::Object(view)
}

/// Merge-patch fragment turning `current` into something `desired` is a subset of
fn diff_value(current: Option<&Value>, desired: &Value) -> Option<Value> {
    match (current, desired) {
        (Some(Value::Object(current)), Value::Object(desired)) => {
            let mut patch = Map::new();
            for (key, value) in desired {
                if let Some(fragment) = diff_value(current.get(key), value) {
                    patch.insert(key.clone(), fragment);
                }
            }
            (!patch.is_empty()).then_some(Value::Object(patch))
        }
        // Elements may carry server defaults; compare only what desired sets
        (Some(Value::Array(current)), Value::Array(desired))
            if current.len() == desired.len()
                && current
                    .iter()
                    .zip(desired)
                    .all(|(current, desired)| diff_value(Some(current), desired).is_none()) =>
        {
            None
        }
        (None, Value::Null) => None,
        (Some(current), desired) if current == desired => None,
        (_, desired) => Some(desired.clone()),
    }
}

/// JSON merge patch taking `existing` to `desired`, or `None` when `existing`
/// already carries every payload field of `desired`
///
/// Only keys present in `desired` are compared; server-managed metadata and
/// status are ignored and no field is ever removed. Arrays of equal length
/// match when every element matches; otherwise the desired array replaces
/// the stored one.
pub fn compute_merge_patch(existing: &DynamicObject, desired: &DynamicObject) -> Option<Value> {
    diff_value(Some(&comparable_view(existing)), &comparable_view(desired))
}

/// `{Kind} {namespace/name}`
fn describe(gvk: &GroupVersionKind, key: &ObjectKey) -> String {
    format!("{} {}", gvk.kind, key)
}

pub(crate) fn created_line(gvk: &GroupVersionKind, key: &ObjectKey, dry_run: bool) -> String {
    if dry_run {
        format!("{} Would create {}", DRY_RUN_PREFIX, describe(gvk, key))
    } else {
        format!("{} {} has been successfully created", APPLIED_PREFIX, describe(gvk, key))
    }
}

pub(crate) fn patched_line(gvk: &GroupVersionKind, key: &ObjectKey, patch: &Value, dry_run: bool) -> String {
    let shown = redact(gvk, patch);
    if dry_run {
        format!("{} Would patch {}: {}", DRY_RUN_PREFIX, describe(gvk, key), shown)
    } else {
        format!(
            "{} {} has been successfully patched: {}",
            APPLIED_PREFIX,
            describe(gvk, key),
            shown
        )
    }
}

pub(crate) fn deleted_line(gvk: &GroupVersionKind, key: &ObjectKey, dry_run: bool) -> String {
    if dry_run {
        format!("{} Would delete {}", DRY_RUN_PREFIX, describe(gvk, key))
    } else {
        format!("{} {} has been successfully deleted", APPLIED_PREFIX, describe(gvk, key))
    }
}

pub(crate) fn up_to_date_line(gvk: &GroupVersionKind, key: &ObjectKey, dry_run: bool) -> String {
    if dry_run {
        format!("{} {} is up-to-date", DRY_RUN_PREFIX, describe(gvk, key))
    } else {
        format!("{} is up-to-date", describe(gvk, key))
    }
}

/// Result of one write together with the line describing it
#[derive(Debug)]
pub(crate) struct Applied<T> {
    pub(crate) value: T,
    pub(crate) line: String,
}

/// Runs writes against one workload store
pub(crate) struct Applier<'a> {
    pub(crate) store: &'a dyn StoreClient,
    pub(crate) dry_run: bool,
    pub(crate) cancel: &'a CancellationToken,
}

impl Applier<'_> {
    fn options(&self) -> WriteOptions {
        WriteOptions { dry_run: self.dry_run }
    }

    pub(crate) async fn create(&self, obj: &DynamicObject) -> Result<Applied<DynamicObject>, ToolError> {
        let gvk = gvk_of(obj)?;
        let key = ObjectKey::from_meta(&obj.metadata);
        let created = cancellable(self.cancel, self.store.create(obj, &self.options())).await?;
        Ok(Applied {
            value: created,
            line: created_line(&gvk, &key, self.dry_run),
        })
    }

    pub(crate) async fn patch(&self, obj: &DynamicObject, patch: &Value) -> Result<Applied<DynamicObject>, ToolError> {
        let gvk = gvk_of(obj)?;
        let key = ObjectKey::from_meta(&obj.metadata);
        let patched = cancellable(self.cancel, self.store.patch(obj, patch, &self.options())).await?;
        Ok(Applied {
            value: patched,
            line: patched_line(&gvk, &key, patch, self.dry_run),
        })
    }

    pub(crate) async fn delete(&self, obj: &DynamicObject) -> Result<Applied<()>, ToolError> {
        let gvk = gvk_of(obj)?;
        let key = ObjectKey::from_meta(&obj.metadata);
        cancellable(self.cancel, self.store.delete(obj, &self.options())).await?;
        Ok(Applied {
            value: (),
            line: deleted_line(&gvk, &key, self.dry_run),
        })
    }

    /// Create `desired` if absent, patch it if its payload differs, otherwise
    /// leave the store untouched
    pub(crate) async fn create_or_patch(&self, desired: &DynamicObject) -> Result<Applied<ApplyOutcome>, ToolError> {
        let gvk = gvk_of(desired)?;
        let key = ObjectKey::from_meta(&desired.metadata);

        let existing = match cancellable(self.cancel, self.store.get(&gvk, &key)).await {
            Ok(existing) => existing,
            Err(e) if e.is_not_found() => {
                debug!("{} {} not found, creating", gvk.kind, key);
                let created = self.create(desired).await?;
                return Ok(Applied {
                    value: ApplyOutcome::Created,
                    line: created.line,
                });
            }
            Err(e) => return Err(e),
        };

        match compute_merge_patch(&existing, desired) {
            None => {
                debug!("{} {} already up-to-date, skipping write", gvk.kind, key);
                Ok(Applied {
                    value: ApplyOutcome::UpToDate,
                    line: up_to_date_line(&gvk, &key, self.dry_run),
                })
            }
            Some(patch) => {
                let patched = self.patch(&existing, &patch).await?;
                Ok(Applied {
                    value: ApplyOutcome::Patched,
                    line: patched.line,
                })
            }
        }
    }
}
