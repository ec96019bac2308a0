// ── Reactive state store ──
//
// Primitive cells with synchronous, ordered change notification, plus the
// derived values and the composition point that wires them together.

mod cell;
mod collection;
mod derivations;
mod derived;
mod state_store;

pub use cell::{Cell, Observable, ReadOnly, Subscription};
pub use collection::{Keyed, KeyedList};
pub use derivations::{Derivations, GraphNode};
pub use derived::Derived;
pub use state_store::{StateStore, StoreConfig, StoreSnapshot};
