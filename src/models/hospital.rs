use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub beds: i32,
    pub theaters: i32,
    pub specialties: Vec<String>,
}
