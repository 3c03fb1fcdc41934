// src/services/receita_service.rs

use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;

use crate::{
    common::error::{AppError, Resource},
    db::{InsumoRepository, ReceitaRepository},
    models::receita::{
        CreateReceitaPayload, InsumoBase, InsumoCalculado, Receita, ReceitaDetalhada,
        ReceitaInsumoPayload, ReceitaInsumoRow, ReceitaResumo, UpdateReceitaPayload,
    },
    services::costing::{self, CostLine},
};

/// Junta a receita, as linhas e o cálculo de custo no formato da API.
pub fn detalhar(receita: Receita, rows: Vec<ReceitaInsumoRow>) -> ReceitaDetalhada {
    let lines: Vec<CostLine> = rows
        .iter()
        .map(|row| CostLine {
            unidade_compra: row.unidade_compra.clone(),
            valor_unidade_compra: row.valor_unidade_compra,
            quantidade_usada: row.quantidade_usada,
            medida_usada: row.medida_usada.clone(),
        })
        .collect();

    let cost = costing::calculate(&lines, receita.lucro_desejado, receita.rendimento_porcoes);

    let insumos = rows
        .into_iter()
        .zip(cost.custos_linhas.iter().copied())
        .map(|(row, custo)| InsumoCalculado {
            id: row.id,
            receita_id: row.receita_id,
            insumo_id: row.insumo_id,
            quantidade_usada: row.quantidade_usada,
            medida_usada: row.medida_usada,
            custo,
            insumo: InsumoBase { id: row.insumo_id, nome: row.insumo_nome },
        })
        .collect();

    ReceitaDetalhada {
        id: receita.id,
        nome: receita.nome,
        rendimento_porcoes: receita.rendimento_porcoes,
        lucro_desejado: receita.lucro_desejado,
        valor_praticado: receita.valor_praticado,
        unidade_id: receita.unidade_id,
        insumos,
        custo_total_receita: cost.custo_total,
        preco_sugerido_total: cost.preco_sugerido_total,
        preco_sugerido_porcao: cost.preco_sugerido_porcao,
    }
}

#[derive(Clone)]
pub struct ReceitaService {
    repo: ReceitaRepository,
    insumo_repo: InsumoRepository,
    pool: PgPool,
}

impl ReceitaService {
    pub fn new(repo: ReceitaRepository, insumo_repo: InsumoRepository, pool: PgPool) -> Self {
        Self { repo, insumo_repo, pool }
    }

    // Todo insumo citado precisa ser da organização, e a medida de uso
    // precisa converter para a unidade de compra dele
    async fn check_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        org_id: i32,
        items: &[ReceitaInsumoPayload],
    ) -> Result<(), AppError> {
        let ids: Vec<i32> = items
            .iter()
            .map(|i| i.insumo_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        let units = self.insumo_repo.purchase_units(&mut **tx, org_id, &ids).await?;
        if units.len() != ids.len() {
            return Err(AppError::NotFound(Resource::Insumo));
        }
        for item in items {
            let compra = units
                .get(&item.insumo_id)
                .ok_or(AppError::NotFound(Resource::Insumo))?;
            if !costing::units_compatible(compra, &item.medida_usada) {
                return Err(AppError::InvalidParameter(format!(
                    "A medida '{}' não converte para a unidade de compra '{}' do insumo.",
                    item.medida_usada, compra
                )));
            }
        }
        Ok(())
    }

    async fn insert_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        receita_id: i32,
        items: &[ReceitaInsumoPayload],
    ) -> Result<(), AppError> {
        for item in items {
            self.repo.insert_item(&mut **tx, receita_id, item).await?;
        }
        Ok(())
    }

    pub async fn create(
        &self,
        org_id: i32,
        unidade_id: i32,
        payload: &CreateReceitaPayload,
    ) -> Result<ReceitaDetalhada, AppError> {
        let mut tx = self.pool.begin().await?;

        self.check_items(&mut tx, org_id, &payload.insumos).await?;

        let receita = self
            .repo
            .create(
                &mut *tx,
                unidade_id,
                &payload.nome,
                payload.rendimento_porcoes,
                payload.lucro_desejado,
            )
            .await?;
        self.insert_items(&mut tx, receita.id, &payload.insumos).await?;

        let rows = self.repo.find_items(&mut *tx, receita.id).await?;
        tx.commit().await?;

        Ok(detalhar(receita, rows))
    }

    pub async fn list(&self, unidade_id: i32) -> Result<Vec<ReceitaResumo>, AppError> {
        self.repo.list(unidade_id).await
    }

    pub async fn get(&self, unidade_id: i32, id: i32) -> Result<ReceitaDetalhada, AppError> {
        let receita = self
            .repo
            .find(&self.pool, id, unidade_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Receita))?;
        let rows = self.repo.find_items(&self.pool, receita.id).await?;
        Ok(detalhar(receita, rows))
    }

    /// Atualização parcial. Se `insumos` vier, substitui todas as linhas.
    pub async fn update(
        &self,
        org_id: i32,
        unidade_id: i32,
        id: i32,
        payload: &UpdateReceitaPayload,
    ) -> Result<ReceitaDetalhada, AppError> {
        let mut tx = self.pool.begin().await?;

        let receita = self
            .repo
            .update(
                &mut *tx,
                id,
                unidade_id,
                payload.nome.as_deref(),
                payload.rendimento_porcoes,
                payload.lucro_desejado,
                payload.valor_praticado,
            )
            .await?
            .ok_or(AppError::NotFound(Resource::Receita))?;

        if let Some(items) = &payload.insumos {
            self.check_items(&mut tx, org_id, items).await?;
            self.repo.delete_items(&mut *tx, receita.id).await?;
            self.insert_items(&mut tx, receita.id, items).await?;
        }

        let rows = self.repo.find_items(&mut *tx, receita.id).await?;
        tx.commit().await?;

        Ok(detalhar(receita, rows))
    }

    pub async fn delete(&self, unidade_id: i32, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.repo
            .find(&mut *tx, id, unidade_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Receita))?;

        self.repo.delete_items(&mut *tx, id).await?;
        self.repo.delete(&mut *tx, id, unidade_id).await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn d(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn receita(lucro: &str, porcoes: Option<i32>) -> Receita {
        Receita {
            id: 1,
            nome: "Bolo de fubá".into(),
            rendimento_porcoes: porcoes,
            lucro_desejado: d(lucro),
            valor_praticado: Decimal::ZERO,
            unidade_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn row(id: i32, nome: &str, compra: &str, preco: &str, qtd: &str, uso: &str) -> ReceitaInsumoRow {
        ReceitaInsumoRow {
            id,
            receita_id: 1,
            insumo_id: id * 10,
            quantidade_usada: d(qtd),
            medida_usada: uso.into(),
            insumo_nome: nome.into(),
            unidade_compra: compra.into(),
            valor_unidade_compra: d(preco),
        }
    }

    #[test]
    fn detail_carries_line_costs_and_prices() {
        let detail = detalhar(
            receita("30", Some(10)),
            vec![row(1, "Fubá", "kg", "10.00", "500", "g")],
        );
        assert_eq!(detail.insumos.len(), 1);
        assert_eq!(detail.insumos[0].custo, d("5.00"));
        assert_eq!(detail.insumos[0].insumo.nome, "Fubá");
        assert_eq!(detail.insumos[0].insumo.id, 10);
        assert_eq!(detail.custo_total_receita, d("5.00"));
        assert_eq!(detail.preco_sugerido_total, d("6.50"));
        assert_eq!(detail.preco_sugerido_porcao, d("0.65"));
    }

    #[test]
    fn recipe_without_lines_costs_nothing() {
        let detail = detalhar(receita("50", None), vec![]);
        assert!(detail.insumos.is_empty());
        assert_eq!(detail.custo_total_receita, Decimal::ZERO);
        assert_eq!(detail.preco_sugerido_porcao, Decimal::ZERO);
    }

    #[test]
    fn lines_keep_input_order() {
        let detail = detalhar(
            receita("0", None),
            vec![
                row(1, "Leite", "l", "6.00", "250", "ml"),
                row(2, "Ovo", "un", "0.80", "3", "unidade"),
            ],
        );
        assert_eq!(detail.insumos[0].custo, d("1.50"));
        assert_eq!(detail.insumos[1].custo, d("2.40"));
        assert_eq!(detail.custo_total_receita, d("3.90"));
    }

    struct Seed {
        org_id: i32,
        unidade_id: i32,
        farinha: i32,
        leite: i32,
    }

    async fn seed(pool: &PgPool) -> Seed {
        let org = crate::db::OrganizationRepository::new(pool.clone())
            .create(pool, "Padaria Central")
            .await
            .unwrap();
        let unidade = crate::db::UnidadeRepository::new(pool.clone())
            .create(pool, org.id, "Matriz")
            .await
            .unwrap();
        let insumos = InsumoRepository::new(pool.clone());
        let farinha = insumos.create(org.id, "Farinha", "kg", d("5.00")).await.unwrap();
        let leite = insumos.create(org.id, "Leite", "l", d("6.00")).await.unwrap();
        Seed { org_id: org.id, unidade_id: unidade.id, farinha: farinha.id, leite: leite.id }
    }

    fn service(pool: &PgPool) -> ReceitaService {
        ReceitaService::new(
            ReceitaRepository::new(pool.clone()),
            InsumoRepository::new(pool.clone()),
            pool.clone(),
        )
    }

    fn line(insumo_id: i32, qtd: &str, medida: &str) -> ReceitaInsumoPayload {
        ReceitaInsumoPayload { insumo_id, quantidade_usada: d(qtd), medida_usada: medida.into() }
    }

    async fn count_lines(pool: &PgPool, receita_id: i32) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM receita_insumos WHERE receita_id = $1")
            .bind(receita_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_removes_the_recipe_and_its_lines(pool: PgPool) {
        let seed = seed(&pool).await;
        let service = service(&pool);

        let payload = CreateReceitaPayload {
            nome: "Bolo de fubá".into(),
            rendimento_porcoes: Some(10),
            lucro_desejado: d("30"),
            insumos: vec![line(seed.farinha, "500", "g"), line(seed.leite, "250", "ml")],
        };
        let created = service.create(seed.org_id, seed.unidade_id, &payload).await.unwrap();
        assert_eq!(created.insumos.len(), 2);
        assert_eq!(created.custo_total_receita, d("4.00"));
        assert_eq!(count_lines(&pool, created.id).await, 2);

        service.delete(seed.unidade_id, created.id).await.unwrap();

        assert_eq!(count_lines(&pool, created.id).await, 0);
        let err = service.get(seed.unidade_id, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::Receita)));

        // Os insumos continuam no catálogo
        let insumos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM insumos WHERE organization_id = $1")
            .bind(seed.org_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(insumos, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn foreign_insumo_aborts_the_whole_recipe(pool: PgPool) {
        let seed = seed(&pool).await;
        let other = seed_other_org_insumo(&pool).await;
        let service = service(&pool);

        let payload = CreateReceitaPayload {
            nome: "Pão doce".into(),
            rendimento_porcoes: None,
            lucro_desejado: d("20"),
            insumos: vec![line(seed.farinha, "1", "kg"), line(other, "1", "kg")],
        };
        let err = service.create(seed.org_id, seed.unidade_id, &payload).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::Insumo)));
        assert!(service.list(seed.unidade_id).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_from_another_unit_is_not_found(pool: PgPool) {
        let seed = seed(&pool).await;
        let service = service(&pool);
        let payload = CreateReceitaPayload {
            nome: "Broa".into(),
            rendimento_porcoes: None,
            lucro_desejado: d("10"),
            insumos: vec![line(seed.farinha, "200", "g")],
        };
        let created = service.create(seed.org_id, seed.unidade_id, &payload).await.unwrap();

        let err = service.delete(seed.unidade_id + 1, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::Receita)));
        assert_eq!(count_lines(&pool, created.id).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn custom_unit_is_accepted_only_when_it_matches_the_purchase(pool: PgPool) {
        let seed = seed(&pool).await;
        let service = service(&pool);
        let fermento = InsumoRepository::new(pool.clone())
            .create(seed.org_id, "Fermento", "pacote", d("3.50"))
            .await
            .unwrap();

        let mut payload = CreateReceitaPayload {
            nome: "Pão francês".into(),
            rendimento_porcoes: None,
            lucro_desejado: d("0"),
            insumos: vec![line(fermento.id, "2", "Pacote")],
        };
        let created = service.create(seed.org_id, seed.unidade_id, &payload).await.unwrap();
        assert_eq!(created.custo_total_receita, d("7.00"));

        payload.insumos = vec![line(fermento.id, "10", "g")];
        let err = service.create(seed.org_id, seed.unidade_id, &payload).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter(_)));
        assert_eq!(service.list(seed.unidade_id).await.unwrap().len(), 1);
    }

    async fn seed_other_org_insumo(pool: &PgPool) -> i32 {
        let org = crate::db::OrganizationRepository::new(pool.clone())
            .create(pool, "Concorrente")
            .await
            .unwrap();
        InsumoRepository::new(pool.clone())
            .create(org.id, "Açúcar", "kg", d("4.00"))
            .await
            .unwrap()
            .id
    }
}
