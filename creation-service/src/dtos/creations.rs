use crate::models::Creation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreationsResponse {
    pub success: bool,
    pub creations: Vec<Creation>,
}

impl From<Vec<Creation>> for CreationsResponse {
    fn from(creations: Vec<Creation>) -> Self {
        Self {
            success: true,
            creations,
        }
    }
}
