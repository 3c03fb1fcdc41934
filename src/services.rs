pub mod auth;
pub mod billing_service;
pub mod caixa_service;
pub mod costing;
pub mod dashboard_service;
pub mod document_service;
pub mod insumo_service;
pub mod pagamento_service;
pub mod receita_service;
pub mod stripe;
pub mod unidade_service;
