// Library surface for the binary, headless integration tests and reuse.
pub mod config;
pub mod input;
pub mod keymap;
pub mod runtime;
pub mod scoring;
pub mod telemetry;
pub mod timer;
pub mod ui;
