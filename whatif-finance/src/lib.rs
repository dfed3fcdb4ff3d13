//! whatif-finance: reference data, merchant resolution, price lookups and the
//! hypothetical-investment calculation.

pub mod analysis;
pub mod enrich;
pub mod performance;
pub mod prices;
pub mod rates;
pub mod reference;
pub mod resolver;
pub mod similarity;

pub use analysis::{Analysis, UnavailableMatch, analyze};
pub use enrich::{IndexFormat, IndexSource};
pub use performance::PerformanceCalculator;
pub use prices::{CachedPriceService, PriceConfig, PricePoint, PriceService, YahooPriceService};
pub use rates::{FixedRates, RateSource};
pub use reference::{ReferenceConfig, ReferenceData, load_reference};
pub use resolver::{MerchantResolver, Resolution, ResolveStage, ResolverConfig};
