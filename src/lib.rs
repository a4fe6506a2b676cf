pub mod app;
pub mod brush_engine;
pub mod canvas;
pub mod error;
pub mod session;
pub mod ui;
pub mod utils;

pub use app::PainterApp;
pub use session::{Session, SessionConfig};
