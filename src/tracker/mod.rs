//! The engine beneath the command-line surface: projects of items stored
//! as append-only change logs, configuration with parent fallback, id
//! generation, filtering and command-line expansion.

pub use self::change::Change;
pub use self::config::Config;
pub use self::error::{io_at, Result, TrackerError};
pub use self::filter::{key_values, ItemFilter};
pub use self::ids::IdGenerator;
pub use self::invocation::Invocation;
pub use self::item::Item;
pub use self::project::{Project, DEFAULT_ID_ALPHABET};
pub use self::storage::Storage;

mod change;
mod config;
mod error;
pub mod file_format;
mod filter;
mod ids;
mod invocation;
mod item;
pub mod parsing;
mod project;
mod storage;
pub mod util;
