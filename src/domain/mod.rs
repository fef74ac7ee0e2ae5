pub mod detection;
pub mod errors;
pub mod labels;
pub mod media;
pub mod model;
pub mod taxonomy;
