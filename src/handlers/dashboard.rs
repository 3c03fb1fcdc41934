// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::{
    common::{error::ApiError, periods::MonthRef},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{CapPageDashboard, RequireCapability},
        tenancy::UnitScope,
    },
    models::dashboard::{DashboardStats, MonthlySummaryItem, StatsQuery},
};

// GET /dashboard/stats
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "Dashboard",
    params(
        StatsQuery,
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses(
        (status = 200, description = "Cards do mês (saldo, vendas, custos e produtos)", body = DashboardStats),
        (status = 401, description = "Assinatura inativa ou sem acesso")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageDashboard>,
    scope: UnitScope,
    Query(query): Query<StatsQuery>,
) -> Result<Json<DashboardStats>, ApiError> {
    let current = MonthRef::of(Utc::now().date_naive());
    let month = MonthRef::new(
        query.ano.unwrap_or(current.ano),
        query.mes.unwrap_or(current.mes),
    )
    .map_err(|e| e.to_api_error(&locale))?;

    let stats = app_state
        .dashboard_service
        .stats(scope.unidade_id, month)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(stats))
}

// GET /dashboard/monthly-summary: sempre os 12 meses até o atual
#[utoipa::path(
    get,
    path = "/dashboard/monthly-summary",
    tag = "Dashboard",
    params(("unidadeId" = i32, Query, description = "ID da unidade")),
    responses((status = 200, description = "Vendas, custos e saldo dos últimos 12 meses", body = Vec<MonthlySummaryItem>)),
    security(("api_jwt" = []))
)]
pub async fn get_monthly_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageDashboard>,
    scope: UnitScope,
) -> Result<Json<Vec<MonthlySummaryItem>>, ApiError> {
    let summary = app_state
        .dashboard_service
        .monthly_summary(scope.unidade_id, Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(summary))
}
