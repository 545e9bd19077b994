use crate::catalog::error::CatalogError;
use crate::model::{
    attribute_field, normalize_name, value_text, Spell, SpellFilter, NAME_FIELD, SYSTEM_FIELD,
    SYSTEM_PARAM,
};
use crate::store::{SpellStore, StoreError};
use serde_json::Value;

/// Look up a single spell by name plus optional narrowing filters.
///
/// Absence is not an error: `Ok(None)` means nothing matched. Two or more
/// matches fail with `AmbiguousMatch` — a name alone can exist in several
/// systems, and the caller has to narrow with `system` to pick one.
pub async fn find_spell<S: SpellStore>(
    store: &S,
    name: &str,
    params: &[(String, String)],
) -> Result<Option<Spell>, CatalogError> {
    let filter = SpellFilter::compile(Some(name), params);
    log::debug!("find_spell name={:?} filter={:?}", name, filter);

    let results = store
        .query(&filter)
        .await
        .map_err(|e| CatalogError::store("find", e))?;

    match results.len() {
        0 => Ok(None),
        1 => {
            let doc = results.into_iter().next().unwrap_or_default();
            let spell =
                Spell::from_document(doc).map_err(|e| CatalogError::decode("find", e))?;
            Ok(Some(spell))
        }
        _ => Err(CatalogError::AmbiguousMatch),
    }
}

/// Validate and store a new spell.
///
/// The existence check ahead of the insert is a fast path for a better
/// error; the store's unique (name, system) index is what actually closes
/// the check-then-write race, and its duplicate rejection maps to
/// `AlreadyExists` as well.
pub async fn create_spell<S: SpellStore>(store: &S, spell: &Spell) -> Result<(), CatalogError> {
    spell.validate()?;

    let system_param = vec![(SYSTEM_PARAM.to_string(), spell.metadata.system.clone())];
    if let Some(existing) = find_spell(store, &spell.name, &system_param).await? {
        // A directly constructed Spell may carry a mixed-case name, so the
        // input side has to be normalized here too.
        if existing.name == normalize_name(&spell.name) {
            return Err(CatalogError::AlreadyExists);
        }
    }

    match store.insert(spell.to_document()).await {
        Ok(()) => {
            log::info!(
                "created spell {:?} in system {:?}",
                spell.name,
                spell.metadata.system
            );
            Ok(())
        }
        Err(StoreError::Duplicate) => Err(CatalogError::AlreadyExists),
        Err(e) => Err(CatalogError::store("create", e)),
    }
}

/// Delete the single spell matching the given name and filters.
///
/// The input filter may be loose, so the spell is resolved first and the
/// delete issued against an exact filter rebuilt from the resolved record's
/// identity. That costs an extra round trip but can never remove more than
/// the one intended record.
pub async fn delete_spell<S: SpellStore>(
    store: &S,
    name: &str,
    params: &[(String, String)],
) -> Result<(), CatalogError> {
    let resolved = find_spell(store, name, params)
        .await?
        .ok_or(CatalogError::NotFound)?;

    let exact = SpellFilter::new()
        .equals(NAME_FIELD, Value::String(resolved.name.clone()))
        .equals(
            SYSTEM_FIELD,
            Value::String(resolved.metadata.system.clone()),
        );

    store
        .delete(&exact)
        .await
        .map_err(|e| CatalogError::store("delete", e))?;
    log::info!(
        "deleted spell {:?} in system {:?}",
        resolved.name,
        resolved.metadata.system
    );

    Ok(())
}

/// List every spell matching the filters; no identity constraint. A decode
/// failure on any one document fails the whole call.
pub async fn list_spells<S: SpellStore>(
    store: &S,
    params: &[(String, String)],
) -> Result<Vec<Spell>, CatalogError> {
    let filter = SpellFilter::compile(None, params);

    let results = store
        .query(&filter)
        .await
        .map_err(|e| CatalogError::store("list", e))?;

    results
        .into_iter()
        .map(|doc| Spell::from_document(doc).map_err(|e| CatalogError::decode("list", e)))
        .collect()
}

/// Distinct stored values for one logical field, as strings. `system` maps
/// to the metadata path, anything else to an attribute path.
pub async fn distinct_values<S: SpellStore>(
    store: &S,
    field: &str,
) -> Result<Vec<String>, CatalogError> {
    let path = if field == SYSTEM_PARAM {
        SYSTEM_FIELD.to_string()
    } else {
        attribute_field(field)
    };

    let values = store
        .distinct_values(&path)
        .await
        .map_err(|e| CatalogError::store("distinct values", e))?;

    // Stores dedupe by stored value, so a number and its string twin can
    // both come back; the string forms have to be deduped again here.
    let mut texts: Vec<String> = Vec::with_capacity(values.len());
    for value in &values {
        let text = value_text(value);
        if !texts.contains(&text) {
            texts.push(text);
        }
    }
    Ok(texts)
}

/// Attribute field names available for faceting. Filters are accepted for
/// interface symmetry but do not narrow the listing.
pub async fn distinct_field_names<S: SpellStore>(
    store: &S,
    _params: &[(String, String)],
) -> Result<Vec<String>, CatalogError> {
    store
        .field_names()
        .await
        .map_err(|e| CatalogError::store("distinct field names", e))
}
