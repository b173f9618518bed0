use serde::Serialize;
use std::fmt;

/// Upstream API surface a call is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V1beta,
}

impl ApiVersion {
    /// Order tried for every candidate: stable surface first.
    pub const ORDER: [ApiVersion; 2] = [ApiVersion::V1, ApiVersion::V1beta];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V1beta => "v1beta",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
