use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateHospitalInput {
    pub name: String,
    pub address: String,
    pub beds: i32,
    pub theaters: i32,
    #[serde(default)]
    pub specialties: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateHospitalInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub beds: Option<i32>,
    pub theaters: Option<i32>,
    pub specialties: Option<Vec<String>>,
}
