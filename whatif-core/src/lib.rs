//! whatif-core: shared types for statement extraction, merchant resolution and
//! the hypothetical-investment calculation.

pub mod company;
pub mod diagnostics;
pub mod money;
pub mod performance;
pub mod script;
pub mod statement;

pub use company::{CompanyRecord, Exchange, MatchConfidence, MatchResult};
pub use diagnostics::Diagnostics;
pub use money::{Currency, Money};
pub use performance::{PerformanceRecord, Unavailable};
pub use statement::{Dialect, RawPage, Transaction};
