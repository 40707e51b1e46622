pub mod clock;
pub mod common;
pub mod dashboard;
pub mod error;
pub mod gui;
pub mod habits;
pub mod logging;
pub mod settings;
pub mod storage;
