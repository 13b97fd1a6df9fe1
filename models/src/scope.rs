use crate::error::model_error::ModelError;
use common::ErrorLocation;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::str::FromStr;

/// How widely a server instance is willing to be shared.
///
/// - `Shared`: any process of the same app with a compatible API version
///   may reuse the instance. Lock files are keyed by API version.
/// - `Isolated`: only processes from the same installation reuse the
///   instance. Lock files are keyed by app signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinationScope {
    #[default]
    Shared,
    Isolated,
}

impl CoordinationScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinationScope::Shared => "shared",
            CoordinationScope::Isolated => "isolated",
        }
    }
}

impl Display for CoordinationScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.as_str())
    }
}

impl FromStr for CoordinationScope {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "shared" => Ok(CoordinationScope::Shared),
            "isolated" => Ok(CoordinationScope::Isolated),
            other => Err(ModelError::InvalidValue {
                what: "coordination scope",
                reason: format!("unrecognized value {other:?}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
