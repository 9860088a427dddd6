pub mod display;
pub mod error;
pub mod figure;
pub mod inputs;
pub mod profile;
pub mod series;
