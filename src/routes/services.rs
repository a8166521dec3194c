use axum::Json;

use crate::model::service::{Service, SERVICES};

pub async fn list() -> Json<&'static [Service]> {
    Json(&SERVICES[..])
}
