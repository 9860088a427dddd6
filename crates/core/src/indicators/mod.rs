//! Derived indicator series computed from fetched closes.

pub mod ema;

pub use ema::{ema, Ema, EMA_SPAN};
