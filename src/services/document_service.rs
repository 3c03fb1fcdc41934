// src/services/document_service.rs

use genpdf::{elements, style, Alignment, Document, Element};
use rust_decimal::Decimal;

use crate::{
    common::{error::AppError, periods::MonthRef},
    models::{
        caixa::{CustoRegistrado, DespesaMensal, FechamentoCompleto},
        receita::ReceitaDetalhada,
    },
};

#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub fonts_dir: String,
    pub font_family: String,
}

/// "R$ 1234,50"
pub fn moeda(valor: Decimal) -> String {
    format!("R$ {:.2}", valor).replace('.', ",")
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Falha ao montar o PDF: {}", e))
}

fn titulo(texto: impl Into<String>) -> impl Element {
    elements::Paragraph::new(texto.into()).styled(style::Style::new().bold().with_font_size(16))
}

fn linha_total(texto: String) -> impl Element {
    let mut p = elements::Paragraph::new(texto);
    p.set_alignment(Alignment::Right);
    p.styled(style::Style::new().bold().with_font_size(12))
}

// Tabela com cabeçalho em negrito; `rows` já vem formatado.
fn tabela(pesos: Vec<usize>, cabecalho: &[&str], rows: Vec<Vec<String>>) -> Result<elements::TableLayout, AppError> {
    let mut table = elements::TableLayout::new(pesos);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold();
    let mut header = table.row();
    for col in cabecalho {
        header = header.element(elements::Paragraph::new(*col).styled(bold));
    }
    header.push().map_err(pdf_error)?;

    for cells in rows {
        let mut row = table.row();
        for cell in cells {
            row = row.element(elements::Paragraph::new(cell));
        }
        row.push().map_err(pdf_error)?;
    }
    Ok(table)
}

#[derive(Clone)]
pub struct DocumentService {
    settings: PdfSettings,
}

impl DocumentService {
    pub fn new(settings: PdfSettings) -> Self {
        Self { settings }
    }

    // Carrega a fonte, monta e renderiza fora do runtime assíncrono
    async fn render<F>(&self, title: String, build: F) -> Result<Vec<u8>, AppError>
    where
        F: FnOnce(&mut Document) -> Result<(), AppError> + Send + 'static,
    {
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || {
            let font_family = genpdf::fonts::from_files(&settings.fonts_dir, &settings.font_family, None)
                .map_err(|_| {
                    AppError::FontNotFound(format!(
                        "Fonte '{}' não encontrada em {}",
                        settings.font_family, settings.fonts_dir
                    ))
                })?;

            let mut doc = Document::new(font_family);
            doc.set_title(title);
            let mut decorator = genpdf::SimplePageDecorator::new();
            decorator.set_margins(10);
            doc.set_page_decorator(decorator);

            build(&mut doc)?;

            let mut buffer = Vec::new();
            doc.render(&mut buffer).map_err(pdf_error)?;
            Ok(buffer)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task do PDF: {}", e))?
    }

    /// Relatório do fechamento diário.
    pub async fn caixa_pdf(&self, caixa: FechamentoCompleto) -> Result<Vec<u8>, AppError> {
        let data = caixa.fechamento.data.format("%d/%m/%Y").to_string();
        self.render(format!("Fechamento de Caixa {}", data), move |doc| {
            doc.push(titulo(format!("Fechamento de Caixa - {}", data)));
            doc.push(elements::Break::new(1.5));

            doc.push(elements::Paragraph::new(format!("Vendas em dinheiro: {}", moeda(caixa.fechamento.vendas_dinheiro))));
            doc.push(elements::Paragraph::new(format!("Vendas no cartão: {}", moeda(caixa.fechamento.vendas_cartao))));
            doc.push(elements::Paragraph::new(format!("Total de vendas: {}", moeda(caixa.vendas_totais()))));
            doc.push(elements::Paragraph::new(format!("Troco para o dia seguinte: {}", moeda(caixa.fechamento.troco_dia_seguinte))));
            doc.push(elements::Break::new(1.5));

            doc.push(elements::Paragraph::new("Despesas do dia").styled(style::Style::new().bold()));
            let despesas = caixa
                .despesas_diarias
                .iter()
                .map(|d| vec![d.descricao.clone(), moeda(d.valor)])
                .collect();
            doc.push(tabela(vec![4, 2], &["Descrição", "Valor"], despesas)?);
            doc.push(elements::Break::new(1));

            doc.push(elements::Paragraph::new("Pagamentos").styled(style::Style::new().bold()));
            let pagamentos = caixa
                .pagamentos
                .iter()
                .map(|p| vec![p.descricao.clone(), p.data.format("%d/%m/%Y").to_string(), moeda(p.valor)])
                .collect();
            doc.push(tabela(vec![4, 2, 2], &["Descrição", "Data", "Valor"], pagamentos)?);
            doc.push(elements::Break::new(1.5));

            doc.push(linha_total(format!("Total de despesas: {}", moeda(caixa.total_despesas()))));
            doc.push(linha_total(format!("Total de pagamentos: {}", moeda(caixa.total_pagamentos()))));
            doc.push(linha_total(format!("Saldo líquido: {}", moeda(caixa.saldo_liquido()))));
            Ok(())
        })
        .await
    }

    pub async fn despesas_pdf(&self, month: MonthRef, despesas: Vec<DespesaMensal>) -> Result<Vec<u8>, AppError> {
        let periodo = format!("{:02}/{}", month.mes, month.ano);
        self.render(format!("Despesas {}", periodo), move |doc| {
            doc.push(titulo(format!("Despesas Operacionais - {}", periodo)));
            doc.push(elements::Break::new(1.5));

            let total: Decimal = despesas.iter().map(|d| d.valor).sum();
            let rows = despesas
                .into_iter()
                .map(|d| {
                    vec![
                        d.fechamento_caixa.data.format("%d/%m/%Y").to_string(),
                        d.descricao,
                        moeda(d.valor),
                    ]
                })
                .collect();
            doc.push(tabela(vec![2, 4, 2], &["Data", "Descrição", "Valor"], rows)?);
            doc.push(elements::Break::new(1.5));
            doc.push(linha_total(format!("Total: {}", moeda(total))));
            Ok(())
        })
        .await
    }

    pub async fn custos_pdf(&self, month: MonthRef, custos: Vec<CustoRegistrado>) -> Result<Vec<u8>, AppError> {
        let periodo = format!("{:02}/{}", month.mes, month.ano);
        self.render(format!("Custos {}", periodo), move |doc| {
            doc.push(titulo(format!("Custos Registrados - {}", periodo)));
            doc.push(elements::Break::new(1.5));

            let total: Decimal = custos.iter().map(|c| c.valor).sum();
            let rows = custos
                .into_iter()
                .map(|c| {
                    vec![
                        c.data_pagamento.format("%d/%m/%Y").to_string(),
                        c.nome,
                        moeda(c.valor),
                    ]
                })
                .collect();
            doc.push(tabela(vec![2, 4, 2], &["Pagamento", "Nome", "Valor"], rows)?);
            doc.push(elements::Break::new(1.5));
            doc.push(linha_total(format!("Total: {}", moeda(total))));
            Ok(())
        })
        .await
    }

    pub async fn receita_pdf(&self, receita: ReceitaDetalhada) -> Result<Vec<u8>, AppError> {
        self.render(format!("Receita {}", receita.nome), move |doc| {
            doc.push(titulo(receita.nome.clone()));
            if let Some(porcoes) = receita.rendimento_porcoes {
                doc.push(elements::Paragraph::new(format!("Rendimento: {} porções", porcoes)));
            }
            doc.push(elements::Paragraph::new(format!("Lucro desejado: {}%", receita.lucro_desejado)));
            doc.push(elements::Break::new(1.5));

            let rows = receita
                .insumos
                .iter()
                .map(|i| {
                    vec![
                        i.insumo.nome.clone(),
                        format!("{} {}", i.quantidade_usada.normalize(), i.medida_usada),
                        moeda(i.custo),
                    ]
                })
                .collect();
            doc.push(tabela(vec![4, 2, 2], &["Insumo", "Quantidade", "Custo"], rows)?);
            doc.push(elements::Break::new(1.5));

            doc.push(linha_total(format!("Custo total: {}", moeda(receita.custo_total_receita))));
            doc.push(linha_total(format!("Preço sugerido: {}", moeda(receita.preco_sugerido_total))));
            if receita.preco_sugerido_porcao > Decimal::ZERO {
                doc.push(linha_total(format!("Preço por porção: {}", moeda(receita.preco_sugerido_porcao))));
            }
            if receita.valor_praticado > Decimal::ZERO {
                doc.push(linha_total(format!("Valor praticado: {}", moeda(receita.valor_praticado))));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_uses_comma_and_two_places() {
        assert_eq!(moeda("12.5".parse().unwrap()), "R$ 12,50");
        assert_eq!(moeda(Decimal::ZERO), "R$ 0,00");
    }

    #[tokio::test]
    async fn missing_font_is_reported() {
        let service = DocumentService::new(PdfSettings {
            fonts_dir: "/caminho/que/nao/existe".into(),
            font_family: "Roboto".into(),
        });
        let month = MonthRef::new(2025, 10).unwrap();
        let err = service.despesas_pdf(month, vec![]).await.unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }
}
