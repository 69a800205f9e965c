//! Run-scoped state: variable bindings, the function table and the story
//! object store.
//!
//! None of this is process-global. Each interpreter run owns its own
//! [`Environment`], [`FunctionTable`] and [`ObjectStore`].

pub mod environment;
pub mod functions;
pub mod object_store;

pub use environment::{Environment, ERROR_VARIABLE, LAST_RESULT};
pub use functions::{Function, FunctionTable};
pub use object_store::ObjectStore;
