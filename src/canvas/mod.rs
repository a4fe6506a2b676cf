pub mod blend;
pub mod history;
pub mod surface;
pub mod viewport;
