use axum::{
    http::header,
    response::{IntoResponse, Response},
};

pub mod auth;
pub mod billing;
pub mod caixa;
pub mod dashboard;
pub mod despesas;
pub mod insumos;
pub mod pagamentos;
pub mod receitas;
pub mod unidades;

// Configura os headers para o navegador baixar o PDF
pub(crate) fn pdf_attachment(bytes: Vec<u8>, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Serviço no ar", body = String))
)]
pub async fn health() -> &'static str {
    "OK"
}
