//! Buffer pools shared between the network path and the stream consumer
//!
//! Both pools index their slots with a power-of-two mask. The engine wraps
//! each pool in a lock; the pools themselves are single-threaded.

pub mod rx;
pub mod tx;

pub use rx::{PoolFull, RxBuffer, RxPool};
pub use tx::TxPool;
