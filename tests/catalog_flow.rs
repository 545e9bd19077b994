use grimoire::{
    create_many, create_spell, delete_spell, distinct_field_names, distinct_values, find_spell,
    list_spells, BatchOutcome, CatalogError, FailureClass, MemoryStore, Spell,
};
use serde_json::json;

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn spell(body: serde_json::Value) -> Spell {
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn full_catalog_lifecycle() {
    let store = MemoryStore::new();

    // Submit with mixed casing; the catalog stores the normalized form.
    create_spell(
        &store,
        &spell(json!({
            "name": "FireBall",
            "description": "A bright streak flashes to a point and blossoms.",
            "attributes": {"school": "evocation", "level": 3, "class": ["wizard", "sorcerer"]},
            "metadata": {"system": "D&D", "creator": "gary"}
        })),
    )
    .await
    .unwrap();

    // Reads compare equal under normalization regardless of submitted casing.
    let found = find_spell(&store, "FIREBALL", &[]).await.unwrap().unwrap();
    assert_eq!(found.name, "fireball");
    assert_eq!(found.metadata.creator.as_deref(), Some("gary"));

    // The wire form title-cases the name and never exposes the creator.
    let wire = serde_json::to_value(&found).unwrap();
    assert_eq!(wire["name"], "Fireball");
    assert_eq!(wire["metadata"], json!({"system": "D&D"}));

    // Same identity under a different casing is a conflict; a different
    // system is a different identity.
    let err = create_spell(
        &store,
        &spell(json!({
            "name": "Fireball",
            "description": "Again.",
            "metadata": {"system": "D&D"}
        })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CatalogError::AlreadyExists));

    create_spell(
        &store,
        &spell(json!({
            "name": "fireball",
            "description": "The Pathfinder one.",
            "metadata": {"system": "Pathfinder"}
        })),
    )
    .await
    .unwrap();

    // Two systems now hold a fireball: a bare name lookup is ambiguous,
    // narrowing by system resolves it.
    let err = find_spell(&store, "fireball", &[]).await.unwrap_err();
    assert!(matches!(err, CatalogError::AmbiguousMatch));
    let narrowed = find_spell(&store, "fireball", &params(&[("system", "Pathfinder")]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(narrowed.metadata.system, "Pathfinder");

    // Listing honors attribute filters; distinct values dedupe.
    assert_eq!(list_spells(&store, &[]).await.unwrap().len(), 2);
    let wizards = list_spells(&store, &params(&[("class", "wizard")])).await.unwrap();
    assert_eq!(wizards.len(), 1);
    let systems = distinct_values(&store, "system").await.unwrap();
    assert_eq!(systems.len(), 2);
    let fields = distinct_field_names(&store, &[]).await.unwrap();
    assert!(fields.contains(&"school".to_string()));

    // Deleting through a loose attribute filter removes only the resolved
    // (name, system) pair.
    delete_spell(&store, "fireball", &params(&[("school", "evocation")]))
        .await
        .unwrap();
    let rest = list_spells(&store, &[]).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].metadata.system, "Pathfinder");
}

#[tokio::test]
async fn batch_create_isolates_failures_per_item() {
    let store = MemoryStore::new();

    let valid = json!({
        "name": "heal",
        "description": "Channel positive energy.",
        "metadata": {"system": "D&D"}
    });
    let missing_description = json!({
        "name": "harm",
        "metadata": {"system": "D&D"}
    });
    let duplicate_of_valid = json!({
        "name": "Heal",
        "description": "Channel positive energy, again.",
        "metadata": {"system": "D&D"}
    });

    let result = create_many(
        &store,
        vec![valid, missing_description, duplicate_of_valid],
    )
    .await;

    assert_eq!(result.count, 3);
    assert!(result.some_failed());
    assert_eq!(result.outcomes[0], BatchOutcome::Created);
    assert!(matches!(
        &result.outcomes[1],
        BatchOutcome::Failed { class: FailureClass::InvalidInput, message }
            if message.contains("description")
    ));
    assert!(matches!(
        &result.outcomes[2],
        BatchOutcome::Failed { class: FailureClass::Conflict, .. }
    ));

    // The successful item survives the sibling failures.
    let kept = find_spell(&store, "heal", &[]).await.unwrap();
    assert!(kept.is_some());
}
