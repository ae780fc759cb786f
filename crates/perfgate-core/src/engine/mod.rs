pub mod cancel;
pub mod orchestrator;
pub mod runner;
