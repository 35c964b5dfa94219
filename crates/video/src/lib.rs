//! This library handles getting video frames on screen: picking a backend that
//! can decode a source, then caching the frames it decodes.
//!
//! ```
//! use video::{BackendRegistry, ProviderSettings, open_cached};
//!
//! let registry = BackendRegistry::with_builtin_backends();
//! let settings = ProviderSettings::default();
//!
//! let mut video = open_cached(&registry, "?dummy:240:64x36:#2FA3FE", 24.0, &settings).unwrap();
//! let frame = video.get_frame(12).unwrap();
//! assert_eq!(frame.pixels()[0], video::pixel!("#2FA3FE"));
//! ```

pub mod backend;
pub mod backends;
pub mod cache;
pub mod frame;
pub mod registry;
pub mod selector;
pub mod settings;

pub use backend::{BackendError, BackendStats, DecodeError, FrameBackend};
pub use cache::FrameCache;
pub use frame::{Dimensions, Frame, Pixel};
pub use registry::BackendRegistry;
pub use selector::{AcquireError, BackendSelector, open_cached};
pub use settings::ProviderSettings;
