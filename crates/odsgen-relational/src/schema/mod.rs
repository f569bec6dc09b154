//! Relational output model.
//!
//! Values here are produced once per compile and are not mutated after the
//! assembler returns them.

mod column;
mod foreign_key;
mod invariants;
mod relational;
mod table;

pub use column::Column;
pub use foreign_key::ForeignKey;
pub use invariants::{check_invariants, InvariantViolation};
pub use relational::{NamespaceSchema, RelationalSchema};
pub use table::{SeedRow, Table, TableKind};
