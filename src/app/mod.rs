pub mod input_handler;
pub mod painter;
pub mod render_helper;
pub mod storage;

pub use painter::PainterApp;
pub use storage::Storage;
