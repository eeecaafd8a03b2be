pub mod types;
pub mod catalog;
pub mod board;
pub mod rig;
pub mod bot;
pub mod supervisor;
pub mod calibration;
pub mod detect;
pub mod sequencer;
pub mod platform;
pub mod settings;
pub mod logger;
pub mod sleep;
