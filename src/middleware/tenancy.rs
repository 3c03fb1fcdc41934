// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::{
    common::error::{ApiError, AppError, Resource},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{authorize, Capability},
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnidadeQuery {
    unidade_id: Option<i32>,
}

// A unidade em que a requisição opera (vinda de `?unidadeId=`).
// Só é construída depois de passar pelo modelo de permissões e pela
// checagem no banco de que a unidade é da organização do token (e, para
// o FILHO, de que o vínculo em user_unidades ainda existe).
#[derive(Debug, Clone, Copy)]
pub struct UnitScope {
    pub unidade_id: i32,
    pub org_id: i32,
}

impl<S> FromRequestParts<S> for UnitScope
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        // A. Usuário do token
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        // B. Lê o unidadeId da query
        let Query(query) = Query::<UnidadeQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                AppError::InvalidParameter("O parâmetro 'unidadeId' deve ser um número inteiro.".into())
                    .to_api_error(&locale)
            })?;

        let unidade_id = query.unidade_id.ok_or_else(|| {
            AppError::InvalidParameter("O parâmetro 'unidadeId' é obrigatório.".into())
                .to_api_error(&locale)
        })?;

        // C. Permissão de acordo com o token
        authorize(&user.0, Capability::Unit(unidade_id)).map_err(|e| e.to_api_error(&locale))?;

        // D. Isolamento de tenant: o token pode estar desatualizado, o banco não
        let belongs = app_state
            .unidade_repo
            .belongs_to_org(unidade_id, user.0.org_id)
            .await
            .map_err(|e| e.to_api_error(&locale))?;

        if !belongs {
            return Err(AppError::NotFound(Resource::Unidade).to_api_error(&locale));
        }

        // E. O vínculo do FILHO pode ter sido removido depois da emissão do token
        if !user.0.is_owner() {
            let assigned = app_state
                .unidade_repo
                .is_assigned(unidade_id, user.0.sub)
                .await
                .map_err(|e| e.to_api_error(&locale))?;
            if !assigned {
                tracing::debug!(user_id = user.0.sub, unidade_id, "Unidade não vinculada ao sub-usuário");
                return Err(AppError::UnitForbidden(unidade_id).to_api_error(&locale));
            }
        }

        Ok(UnitScope { unidade_id, org_id: user.0.org_id })
    }
}
