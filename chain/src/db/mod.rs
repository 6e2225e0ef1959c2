mod index;
mod table;
mod undo;

pub use index::{MultiIndex, SecondaryIndex, UniqueIndex};
pub use table::Table;
pub use undo::UndoLevel;
