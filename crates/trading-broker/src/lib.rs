//! Brokerage integrations.

mod bridge;
mod paper;

pub use bridge::{BridgeBrokerage, BridgeConfig};
pub use paper::{PaperBrokerage, PaperStats};

/// Terminal trade server return codes.
pub mod retcode {
    /// Request completed
    pub const DONE: i32 = 10009;
    /// Request rejected
    pub const REJECT: i32 = 10006;
}
