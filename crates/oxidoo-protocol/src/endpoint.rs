//! Logical service endpoints of the remote server.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One of the three logical service paths the remote server exposes.
///
/// Every RPC call addresses exactly one endpoint; the endpoint name travels
/// in the `service` field of the JSON-RPC call parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Version probing and credential exchange (`version`, `login`).
    Common,
    /// Generic model operations (`execute`).
    Object,
    /// Report rendering and polling (`render_report`, `report_get`).
    Report,
}

impl Endpoint {
    /// The wire name of this endpoint.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Object => "object",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        match name.as_str() {
            "common" => Ok(Self::Common),
            "object" => Ok(Self::Object),
            "report" => Ok(Self::Report),
            other => Err(serde::de::Error::custom(format!("unknown endpoint: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_wire_names() {
        assert_eq!(Endpoint::Common.as_str(), "common");
        assert_eq!(Endpoint::Object.as_str(), "object");
        assert_eq!(Endpoint::Report.as_str(), "report");
    }

    #[test]
    fn test_endpoint_serde_round_trip() {
        for endpoint in [Endpoint::Common, Endpoint::Object, Endpoint::Report] {
            let encoded = serde_json::to_string(&endpoint).unwrap();
            let decoded: Endpoint = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, endpoint);
        }
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let result: Result<Endpoint, _> = serde_json::from_str("\"db\"");
        assert!(result.is_err());
    }
}
