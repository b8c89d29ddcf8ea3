pub mod batch_writer;
pub mod outcome;
pub mod traits;

pub use batch_writer::{BatchWriter, DEFAULT_BATCH_SIZE};
pub use outcome::StoreOutcome;
pub use traits::{PersistRecords, StatStore, StoreBatch};
