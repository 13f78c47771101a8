use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::resource::ResourceKind;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateResourceInput {
    pub name: String,
    pub kind: ResourceKind,
    #[serde(default = "default_available")]
    pub available: bool,
    /// Required for super_admin; hospital_admin resources always land in
    /// their own hospital.
    pub hospital_id: Option<Uuid>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateResourceInput {
    pub name: Option<String>,
    pub kind: Option<ResourceKind>,
    pub available: Option<bool>,
}
