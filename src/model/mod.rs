pub mod store;
pub mod stroke;
