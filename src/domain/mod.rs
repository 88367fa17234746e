// Domain layer: core models and ports (interfaces) for the reference material,
// the classifier and the heading extractor.

pub mod model;
pub mod ports;
