pub mod calligraphy;
pub mod freehand;
pub mod settings;
pub mod shape;
pub mod spray;
pub mod stroke;
pub mod symmetry;
