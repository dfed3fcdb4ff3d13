use serde::{Deserialize, Serialize};

/// Per-component diagnostic switches, handed to each component when it is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Log every line the parser drops, with the reason.
    #[serde(default)]
    pub log_rejected_lines: bool,
    /// Log which resolver stages ran for each merchant.
    #[serde(default)]
    pub log_resolver_stages: bool,
}

impl Diagnostics {
    pub fn verbose() -> Self {
        Self {
            log_rejected_lines: true,
            log_resolver_stages: true,
        }
    }
}
