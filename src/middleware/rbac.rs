// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        auth::{Claims, Page},
        organization::SubscriptionStatus,
    },
};

/// O que uma requisição pode pedir ao modelo de permissões.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageChildren,
    ManageUnits,
    ManageBilling,
    Page(Page),
    Unit(i32),
}

impl Capability {
    fn is_owner_only(&self) -> bool {
        matches!(
            self,
            Capability::ManageChildren | Capability::ManageUnits | Capability::ManageBilling
        )
    }
}

/// Páginas efetivas de um usuário. O FILHO sempre tem o caixa.
pub fn effective_pages(claims: &Claims) -> Vec<Page> {
    if claims.is_owner() {
        return Page::ALL.to_vec();
    }
    let mut pages: Vec<Page> = claims
        .allowed_pages
        .iter()
        .filter_map(|p| Page::parse(p))
        .collect();
    if !pages.contains(&Page::Caixa) {
        pages.push(Page::Caixa);
    }
    pages
}

/// Ponto único de decisão de acesso.
///
/// - PAI: tudo o que é da organização; páginas de negócio só com assinatura ACTIVE.
/// - FILHO: nunca as capacidades do PAI; páginas liberadas + caixa; só as unidades atribuídas.
pub fn authorize(claims: &Claims, capability: Capability) -> Result<(), AppError> {
    if claims.is_owner() {
        return match capability {
            Capability::Page(page)
                if claims.subscription_status != SubscriptionStatus::Active
                    && !page.is_billing_management() =>
            {
                Err(AppError::SubscriptionRequired)
            }
            // Unidades do PAI: a posse é conferida no banco (UnitScope), já que o
            // token não conhece unidades criadas depois da emissão.
            _ => Ok(()),
        };
    }

    if capability.is_owner_only() {
        return Err(AppError::OwnerOnly);
    }

    match capability {
        Capability::Page(page) => {
            if effective_pages(claims).contains(&page) {
                Ok(())
            } else {
                Err(AppError::PageForbidden(page.as_str().to_string()))
            }
        }
        Capability::Unit(id) => {
            if claims.unidades_permitidas.iter().any(|u| u.id == id) {
                Ok(())
            } else {
                Err(AppError::UnitForbidden(id))
            }
        }
        _ => Err(AppError::OwnerOnly),
    }
}

/// 1. O Trait que define o que é uma Capacidade exigida por uma rota
pub trait CapabilityDef: Send + Sync + 'static {
    fn capability() -> Capability;
}

/// 2. O Extractor (Guardião)
pub struct RequireCapability<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: CapabilityDef,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(&parts.headers);

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        authorize(&user.0, T::capability()).map_err(|e| {
            tracing::debug!(user_id = user.0.sub, capability = ?T::capability(), "Acesso negado");
            e.to_api_error(&locale)
        })?;

        Ok(RequireCapability(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS CAPACIDADES (TIPOS)
// ---

pub struct CapManageChildren;
impl CapabilityDef for CapManageChildren {
    fn capability() -> Capability { Capability::ManageChildren }
}

pub struct CapManageUnits;
impl CapabilityDef for CapManageUnits {
    fn capability() -> Capability { Capability::ManageUnits }
}

pub struct CapManageBilling;
impl CapabilityDef for CapManageBilling {
    fn capability() -> Capability { Capability::ManageBilling }
}

pub struct CapPageDashboard;
impl CapabilityDef for CapPageDashboard {
    fn capability() -> Capability { Capability::Page(Page::Dashboard) }
}

pub struct CapPageCaixa;
impl CapabilityDef for CapPageCaixa {
    fn capability() -> Capability { Capability::Page(Page::Caixa) }
}

pub struct CapPageInsumos;
impl CapabilityDef for CapPageInsumos {
    fn capability() -> Capability { Capability::Page(Page::Insumos) }
}

pub struct CapPageReceitas;
impl CapabilityDef for CapPageReceitas {
    fn capability() -> Capability { Capability::Page(Page::Receitas) }
}

pub struct CapPageCustos;
impl CapabilityDef for CapPageCustos {
    fn capability() -> Capability { Capability::Page(Page::Custos) }
}

pub struct CapPageCustosOperacionais;
impl CapabilityDef for CapPageCustosOperacionais {
    fn capability() -> Capability { Capability::Page(Page::CustosOperacionais) }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::auth::{UnidadeRef, UserRole};

    pub(crate) fn claims(role: UserRole, status: SubscriptionStatus) -> Claims {
        let unidades = vec![
            UnidadeRef { id: 1, name: "Unidade Principal".into() },
            UnidadeRef { id: 2, name: "Filial Centro".into() },
        ];
        let (permitidas, pages) = match role {
            UserRole::Pai => (unidades.clone(), Page::all_ids()),
            UserRole::Filho => (vec![unidades[0].clone()], vec!["insumos".to_string()]),
        };
        Claims {
            sub: 10,
            email: Some("dono@padaria.com".into()),
            username: None,
            name: "Dono".into(),
            company_name: Some("Padaria".into()),
            role,
            org_id: 7,
            unidades,
            unidades_permitidas: permitidas,
            allowed_pages: pages,
            subscription_status: status,
            unidade_limit: Some(2),
            plan_type: "Elite".into(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn sub_user_always_gets_caixa() {
        let mut filho = claims(UserRole::Filho, SubscriptionStatus::Incomplete);
        filho.allowed_pages = vec![];
        assert!(authorize(&filho, Capability::Page(Page::Caixa)).is_ok());
        assert_eq!(effective_pages(&filho), vec![Page::Caixa]);
    }

    #[test]
    fn sub_user_is_limited_to_assigned_pages_and_units() {
        let filho = claims(UserRole::Filho, SubscriptionStatus::Active);
        assert!(authorize(&filho, Capability::Page(Page::Insumos)).is_ok());
        assert!(matches!(
            authorize(&filho, Capability::Page(Page::Dashboard)),
            Err(AppError::PageForbidden(_))
        ));
        assert!(authorize(&filho, Capability::Unit(1)).is_ok());
        assert!(matches!(
            authorize(&filho, Capability::Unit(2)),
            Err(AppError::UnitForbidden(2))
        ));
    }

    #[test]
    fn sub_user_never_gets_owner_capabilities() {
        let filho = claims(UserRole::Filho, SubscriptionStatus::Active);
        for cap in [Capability::ManageChildren, Capability::ManageUnits, Capability::ManageBilling] {
            assert!(matches!(authorize(&filho, cap), Err(AppError::OwnerOnly)));
        }
    }

    #[test]
    fn owner_reaches_units_created_after_the_token() {
        let pai = claims(UserRole::Pai, SubscriptionStatus::Active);
        assert!(authorize(&pai, Capability::Unit(1)).is_ok());
        assert!(authorize(&pai, Capability::Unit(3)).is_ok());
        assert!(authorize(&pai, Capability::ManageUnits).is_ok());
    }

    #[test]
    fn inactive_owner_only_reaches_account_and_plans() {
        for status in [
            SubscriptionStatus::Incomplete,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Canceled,
        ] {
            let pai = claims(UserRole::Pai, status);
            assert!(matches!(
                authorize(&pai, Capability::Page(Page::Receitas)),
                Err(AppError::SubscriptionRequired)
            ));
            assert!(authorize(&pai, Capability::Page(Page::Conta)).is_ok());
            assert!(authorize(&pai, Capability::Page(Page::Planos)).is_ok());
            assert!(authorize(&pai, Capability::ManageBilling).is_ok());
        }
    }

    #[test]
    fn sub_users_are_not_gated_by_subscription() {
        let filho = claims(UserRole::Filho, SubscriptionStatus::Canceled);
        assert!(authorize(&filho, Capability::Page(Page::Caixa)).is_ok());
    }
}
