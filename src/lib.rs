pub mod api;
pub mod catalog;
pub mod config;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export catalog operations and error taxonomy
pub use catalog::{
    create_many, create_spell, delete_spell, distinct_field_names, distinct_values, find_spell,
    list_spells, BatchOutcome, BatchResult, CatalogError, FailureClass,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{Document, MemoryStore, PostgresStore, SpellStore, StoreError};
