pub mod catalog;
pub mod discovery;
pub mod exif;
pub mod resolver;
pub mod sampler;
pub mod session;
pub mod signature;
