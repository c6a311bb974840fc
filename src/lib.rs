pub mod core;
pub mod logging;

// The admission pipeline, data-flow order
pub mod request;
pub mod state;
pub mod rules;
pub mod chain;
pub mod decision;
pub mod engine;
