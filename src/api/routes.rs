use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::store::SpellStore;

pub fn create_router<S: SpellStore + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Spell catalog
        .route("/spells", get(handlers::list_spells::<S>))
        .route("/spells", post(handlers::post_spell::<S>))
        .route("/spells/batch", post(handlers::post_spell_batch::<S>))
        .route("/spells/:name", get(handlers::get_spell::<S>))
        .route("/spells/:name", delete(handlers::delete_spell::<S>))
        // Faceting metadata
        .route("/spellmetadata", get(handlers::list_spell_metadata::<S>))
        .route("/spellmetadata/:name", get(handlers::get_spell_metadata::<S>))
}
