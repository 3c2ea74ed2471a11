//! CDP Core - customer-data sandbox
//!
//! Schema-driven synthetic profiles over a flat key/value store:
//! - Schema registry with single-identity enforcement
//! - Profile generator sampling a value per field type
//! - Segment rules with a loose-equality match predicate
//! - Journey playback as an owned, cancelable task
//!
//! # Example
//!
//! ```rust,ignore
//! use cdp_core::{Platform, PlatformConfig};
//! use cdp_store::MemoryStore;
//!
//! let mut sandbox = Platform::open(MemoryStore::new(), PlatformConfig::new())?;
//! sandbox.generate_profiles("Customer", 10)?;
//! sandbox.create_segment("Peters", "firstName", "Peter")?;
//!
//! let journey = sandbox.start_journey(0, Some(0))?;
//! println!("{}", sandbox.stats());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod generator;
pub mod journey;
pub mod platform;
pub mod schema;
pub mod segment;
pub mod state;
pub mod types;
pub mod value;
pub mod views;

// Re-exports for convenience
pub use config::PlatformConfig;
pub use error::{PlatformError, PlatformResult};
pub use generator::{coerce_count, Clock, FixedClock, ProfileGenerator, SystemClock, MAX_BATCH_SIZE};
pub use journey::{JourneyPlayback, JourneyStepper, PlaybackObserver, PlaybackStatus};
pub use platform::Platform;
pub use schema::{field_summary, SaveOutcome, SchemaRegistry};
pub use segment::{matches, SegmentRules};
pub use state::PlatformState;
pub use types::{ExportDocument, Field, FieldType, JourneyRecord, Profile, Schema, Segment};
pub use views::QuickStats;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the sandbox
    pub use crate::{
        Field, FieldType, Platform, PlatformConfig, PlatformError, Profile, Schema, Segment,
    };
    pub use cdp_store::{FileStore, KeyValueStore, MemoryStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
