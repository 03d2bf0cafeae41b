//! Search input debouncing.

mod debouncer;
mod input;
mod timer;

pub use debouncer::{DEFAULT_DEBOUNCE, SearchDebouncer};
pub use input::{SearchInput, SearchTarget};
pub use timer::CancellableTimer;
