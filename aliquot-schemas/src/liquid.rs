use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Liquid {
    pub liquid_id: String,
    pub name: String,
    pub description: String,
    pub display_color: String,
}
