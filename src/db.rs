pub mod user_repo;
pub use user_repo::UserRepository;
pub mod organization_repo;
pub use organization_repo::OrganizationRepository;
pub mod unidade_repo;
pub use unidade_repo::UnidadeRepository;
pub mod insumo_repo;
pub use insumo_repo::InsumoRepository;
pub mod receita_repo;
pub use receita_repo::ReceitaRepository;
pub mod caixa_repo;
pub use caixa_repo::CaixaRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod billing_repo;

pub use billing_repo::BillingRepository;
