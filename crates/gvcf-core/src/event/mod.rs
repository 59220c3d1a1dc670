//! Eventos de corrida, trait `RunEventStore` y `Journal`.

mod journal;
mod store;
mod types;

pub use journal::Journal;
pub use store::{InMemoryRunEventStore, RunEventStore};
pub use types::{RunEvent, RunEventKind};
