//! Repository implementations over `SeaORM`.

mod ledger;

pub use ledger::{PgStore, PgUnitOfWork};
