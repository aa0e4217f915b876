use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitRequest {
    #[serde(rename = "initData", default)]
    pub init_data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitResponse {
    pub status: String,
    pub user_data: BTreeMap<String, String>,
    pub user_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}
