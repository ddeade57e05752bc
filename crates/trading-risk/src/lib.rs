//! Order policy for the crossover bot.
//!
//! Turns a signal transition and a quote into a market order with
//! stop-loss and take-profit levels.

mod order_policy;

pub use order_policy::{protective_levels, Offsets, OrderPolicy, OrderPolicyConfig};
