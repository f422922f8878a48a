mod date;
mod ledger;
mod money;
mod transaction;

pub use date::*;
pub use ledger::*;
pub use money::*;
pub use transaction::*;
