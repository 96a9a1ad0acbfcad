/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Liveness check",
    responses((status = 200, description = "Server is up", body = String)),
)]
pub async fn health() -> &'static str {
    "ok"
}
