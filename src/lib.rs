pub mod config;
pub mod core;

pub use config::{ConfigError, SamplerConfig};
pub use core::catalog::{Catalog, CatalogError, CatalogStore};
pub use core::discovery::{DiscoveryError, discover_media};
pub use core::exif::{ExifError, ExifService, Metadata, MetadataExtractor};
pub use core::resolver::{DialoguerNames, DiscoveryPrompt, NameSource, ResolveOutcome};
pub use core::sampler::{DiscoveryRecord, HaltReason, SampleReport, Sampler, Targets};
pub use core::session::{SessionError, SessionOutcome, SessionProgress, run_session};
pub use core::signature::Signature;
