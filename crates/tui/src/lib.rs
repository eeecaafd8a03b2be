pub mod app;
pub mod confirm;
pub mod event;
pub mod status;
pub mod ui;

pub use app::App;
pub use status::StatusBoard;
