pub mod auth;
pub mod billing;
pub mod caixa;
pub mod dashboard;
pub mod insumo;
pub mod organization;
pub mod receita;
