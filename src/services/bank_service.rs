// src/services/bank_service.rs

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::BankRepository;
use crate::models::bank::{BankMovement, NewMovement};

/// Livro-razão da empresa. Todo movimento de saldo passa por aqui, sempre dentro
/// da transação de quem o provocou.
#[derive(Clone)]
pub struct BankService {
    repo: BankRepository,
}

impl BankService {
    pub fn new(repo: BankRepository) -> Self {
        Self { repo }
    }

    /// Incrementa o saldo e registra o lançamento na mesma conexão.
    /// Valor zero não gera lançamento (retorna `None`).
    pub async fn post_movement(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        movement: NewMovement<'_>,
    ) -> Result<Option<BankMovement>, AppError> {
        if movement.amount == Decimal::ZERO {
            return Ok(None);
        }

        let balance = self.repo.increment_balance(&mut *conn, company_id, movement.amount).await?;
        let created = self.repo.insert_movement(&mut *conn, company_id, &movement).await?;

        tracing::info!(
            %company_id,
            movement_type = ?created.movement_type,
            amount = %created.amount,
            balance = %balance,
            "💰 Lançamento registrado"
        );

        Ok(Some(created))
    }

    pub async fn list_movements(&self, company_id: Uuid) -> Result<Vec<BankMovement>, AppError> {
        self.repo.list_movements(company_id).await
    }
}
