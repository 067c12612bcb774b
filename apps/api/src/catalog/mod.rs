// Marketplace catalog: product browsing, listing, cart and purchases.
// Listing CRUD is plain record manipulation; the market mutator writes
// through `CatalogStore` only.

pub mod handlers;
pub mod queries;
pub mod store;

pub use store::{CatalogStore, PgCatalogStore};
