// storefront/src/models/envelope.rs

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

/// Envelope every backend response is wrapped in.
///
/// Fields the backend leaves out, or sends as `null`, decode to their zero
/// values.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de> + Default"))]
pub struct ApiResponse<T> {
  #[serde_as(as = "DefaultOnNull")]
  pub success: bool,
  pub message: Option<String>,
  pub error: Option<String>,
  #[serde_as(as = "DefaultOnNull")]
  pub data: T,
}
