//! Data-access contracts and in-memory stores for FlowCart.
//!
//! The services depend only on the traits in this crate; the in-memory
//! implementations back the dev server and the test suites. Every store
//! is safe to share across request tasks (`Arc<RwLock<..>>` internally).

mod cart;
mod catalog;
mod order;

pub use cart::{CartStore, InMemoryCartStore};
pub use catalog::{InMemoryCatalog, ProductCatalog};
pub use order::{InMemoryOrderStore, OrderStore};
