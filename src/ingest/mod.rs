pub mod dates;
pub mod normalizer;
pub mod schema;

pub use normalizer::Normalizer;
