//! Helpers for working with raw JSON documents.

use serde_json::Value;

/// Key under which backends record a document's assigned ID.
pub const ID_FIELD: &str = "id";

/// Stamp a document with its assigned ID.
///
/// Non-object documents are left untouched; they simply have no embedded
/// identity and rely on the caller tracking the returned [`RecordId`].
///
/// [`RecordId`]: crate::RecordId
pub(crate) fn stamp_id(document: &mut Value, id: &crate::RecordId) {
    if let Value::Object(map) = document {
        map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }
}

/// Merge the top-level fields of `patch` into `existing`.
///
/// This is the partial-merge-replace used for settings documents: only the
/// fields named in the patch are overwritten, everything else (including
/// the embedded ID) is preserved. Returns the merged document.
///
/// A non-object patch replaces the document outright, mirroring a full
/// overwrite.
#[must_use]
pub fn merge_fields(existing: Value, patch: Value) -> Value {
    match (existing, patch) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (key, value) in patch {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}
