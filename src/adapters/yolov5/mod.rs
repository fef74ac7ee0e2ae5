pub mod detector;
pub mod runtime_probe;
pub mod weights_catalog;
