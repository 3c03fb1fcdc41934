// src/db/receita_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::receita::{Receita, ReceitaInsumoPayload, ReceitaInsumoRow, ReceitaResumo},
};

const RECEITA_COLUMNS: &str = r#"
    id, nome, rendimento_porcoes, lucro_desejado, valor_praticado,
    unidade_id, created_at, updated_at
"#;

#[derive(Clone)]
pub struct ReceitaRepository {
    pool: PgPool,
}

impl ReceitaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        unidade_id: i32,
        nome: &str,
        rendimento_porcoes: Option<i32>,
        lucro_desejado: Decimal,
    ) -> Result<Receita, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO receitas (nome, rendimento_porcoes, lucro_desejado, unidade_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {RECEITA_COLUMNS}
            "#
        );
        let receita = sqlx::query_as::<_, Receita>(&sql)
            .bind(nome)
            .bind(rendimento_porcoes)
            .bind(lucro_desejado)
            .bind(unidade_id)
            .fetch_one(executor)
            .await?;
        Ok(receita)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        receita_id: i32,
        item: &ReceitaInsumoPayload,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO receita_insumos (receita_id, insumo_id, quantidade_usada, medida_usada)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(receita_id)
        .bind(item.insumo_id)
        .bind(item.quantidade_usada)
        .bind(&item.medida_usada)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_items<'e, E>(&self, executor: E, receita_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM receita_insumos WHERE receita_id = $1")
            .bind(receita_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list(&self, unidade_id: i32) -> Result<Vec<ReceitaResumo>, AppError> {
        let receitas = sqlx::query_as::<_, ReceitaResumo>(
            "SELECT id, nome FROM receitas WHERE unidade_id = $1 ORDER BY nome",
        )
        .bind(unidade_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(receitas)
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        id: i32,
        unidade_id: i32,
    ) -> Result<Option<Receita>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {RECEITA_COLUMNS} FROM receitas WHERE id = $1 AND unidade_id = $2");
        let receita = sqlx::query_as::<_, Receita>(&sql)
            .bind(id)
            .bind(unidade_id)
            .fetch_optional(executor)
            .await?;
        Ok(receita)
    }

    /// Linhas da receita já com os dados de compra do insumo.
    pub async fn find_items<'e, E>(&self, executor: E, receita_id: i32) -> Result<Vec<ReceitaInsumoRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ReceitaInsumoRow>(
            r#"
            SELECT
                ri.id, ri.receita_id, ri.insumo_id, ri.quantidade_usada, ri.medida_usada,
                i.nome AS insumo_nome, i.unidade_compra, i.valor_unidade_compra
            FROM receita_insumos ri
            JOIN insumos i ON i.id = ri.insumo_id
            WHERE ri.receita_id = $1
            ORDER BY ri.id
            "#,
        )
        .bind(receita_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i32,
        unidade_id: i32,
        nome: Option<&str>,
        rendimento_porcoes: Option<i32>,
        lucro_desejado: Option<Decimal>,
        valor_praticado: Option<Decimal>,
    ) -> Result<Option<Receita>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE receitas SET
                nome = COALESCE($3, nome),
                rendimento_porcoes = COALESCE($4, rendimento_porcoes),
                lucro_desejado = COALESCE($5, lucro_desejado),
                valor_praticado = COALESCE($6, valor_praticado),
                updated_at = NOW()
            WHERE id = $1 AND unidade_id = $2
            RETURNING {RECEITA_COLUMNS}
            "#
        );
        let receita = sqlx::query_as::<_, Receita>(&sql)
            .bind(id)
            .bind(unidade_id)
            .bind(nome)
            .bind(rendimento_porcoes)
            .bind(lucro_desejado)
            .bind(valor_praticado)
            .fetch_optional(executor)
            .await?;
        Ok(receita)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32, unidade_id: i32) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM receitas WHERE id = $1 AND unidade_id = $2")
            .bind(id)
            .bind(unidade_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
