mod ids;
mod queries;
mod tables;

use crate::{ErrorCode, Result};
use anyhow::anyhow;
use sea_orm::{
    entity::prelude::*, ActiveValue, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    IntoActiveModel, IsolationLevel, PaginatorTrait, QueryOrder, QuerySelect, TransactionTrait,
};
use sqlx::{
    migrate::{Migrate, Migration, MigrationSource},
    Connection,
};
use std::{
    collections::{BTreeSet, HashMap},
    future::Future,
    ops::Deref,
    path::Path,
    sync::Arc,
    time::Duration,
};

pub use ids::*;
pub use queries::chat_rooms::{ChatMessageWithSender, ChatRoomDetails, CreateChatRoomParams};
pub use queries::comments::CommentWithAuthor;
pub use queries::members::{MemberProfile, NewMemberParams};
pub use queries::projects::{
    haversine_distance_km, reconcile_tech_stacks, CreateProjectParams, Location, NearbyProject,
    ProjectCondition, ProjectDetails, ProjectDistance, ProjectSummary, ProjectWithTechStacks,
    TechStackDiff, UpdateProjectParams,
};
pub use sea_orm::ConnectOptions;
pub use tables::*;

/// Access to the relational store.
///
/// Every public method runs in its own transaction: the closure passed to
/// [`Database::transaction`] either completes and the transaction commits, or
/// returns an error and everything it wrote is rolled back.
pub struct Database {
    options: ConnectOptions,
    pool: DatabaseConnection,
}

impl Database {
    /// Connects to the database with the given options
    pub async fn new(options: ConnectOptions) -> Result<Self> {
        sqlx::any::install_default_drivers();
        Ok(Self {
            options: options.clone(),
            pool: sea_orm::Database::connect(options).await?,
        })
    }

    /// Runs the database migrations.
    pub async fn migrate(
        &self,
        migrations_path: &Path,
        ignore_checksum_mismatch: bool,
    ) -> anyhow::Result<Vec<(Migration, Duration)>> {
        let migrations = MigrationSource::resolve(migrations_path)
            .await
            .map_err(|err| anyhow!("failed to load migrations: {err:?}"))?;

        let mut connection = sqlx::AnyConnection::connect(self.options.get_url()).await?;

        connection.ensure_migrations_table().await?;
        let applied_migrations: HashMap<_, _> = connection
            .list_applied_migrations()
            .await?
            .into_iter()
            .map(|migration| (migration.version, migration))
            .collect();

        let mut new_migrations = Vec::new();
        for migration in migrations {
            match applied_migrations.get(&migration.version) {
                Some(applied_migration) => {
                    if migration.checksum != applied_migration.checksum
                        && !ignore_checksum_mismatch
                    {
                        Err(anyhow!(
                            "checksum mismatch for applied migration {}",
                            migration.description
                        ))?;
                    }
                }
                None => {
                    let elapsed = connection.apply(&migration).await?;
                    new_migrations.push((migration, elapsed));
                }
            }
        }

        Ok(new_migrations)
    }

    async fn transaction<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Send + Fn(TransactionHandle) -> Fut,
        Fut: Send + Future<Output = Result<T>>,
    {
        let (tx, result) = self.with_transaction(&f).await?;
        match result {
            Ok(result) => {
                tx.commit().await?;
                Ok(result)
            }
            Err(error) => {
                tx.rollback().await?;
                Err(error)
            }
        }
    }

    async fn with_transaction<F, Fut, T>(&self, f: &F) -> Result<(DatabaseTransaction, Result<T>)>
    where
        F: Send + Fn(TransactionHandle) -> Fut,
        Fut: Send + Future<Output = Result<T>>,
    {
        let tx = self
            .pool
            .begin_with_config(Some(IsolationLevel::ReadCommitted), None)
            .await?;

        let mut tx = Arc::new(Some(tx));
        let result = f(TransactionHandle(tx.clone())).await;
        let Some(tx) = Arc::get_mut(&mut tx).and_then(|tx| tx.take()) else {
            return Err(anyhow!(
                "couldn't complete transaction because it's still in use"
            ))?;
        };

        Ok((tx, result))
    }
}

pub struct TransactionHandle(Arc<Option<DatabaseTransaction>>);

impl Deref for TransactionHandle {
    type Target = DatabaseTransaction;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref().as_ref().unwrap()
    }
}
