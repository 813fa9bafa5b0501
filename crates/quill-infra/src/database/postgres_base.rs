use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel,
    PrimaryKeyTrait,
};
use uuid::Uuid;

use quill_core::error::RepoError;
use quill_core::ports::BaseRepository;

/// Generic PostgreSQL repository for entities keyed by a Uuid primary key,
/// parameterized over the entity's active model.
pub struct PostgresRepository<A>
where
    A: ActiveModelTrait,
{
    pub(crate) db: DbConn,
    _marker: PhantomData<A>,
}

impl<A> PostgresRepository<A>
where
    A: ActiveModelTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }
}

pub(crate) fn map_save_err(e: DbErr) -> RepoError {
    let err_str = e.to_string();
    if err_str.contains("duplicate") || err_str.contains("unique") {
        RepoError::Constraint("entity already exists".to_string())
    } else {
        RepoError::Query(err_str)
    }
}

#[async_trait]
impl<A, T> BaseRepository<T> for PostgresRepository<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Clone + Send + Sync + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A> + Sync + Send,
    <A::Entity as EntityTrait>::PrimaryKey: PrimaryKeyTrait<ValueType = Uuid>,
    T: From<<A::Entity as EntityTrait>::Model> + Into<A> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let result = <A::Entity as EntityTrait>::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        // Our domain constructors always set the primary key, so SeaORM's
        // set-key-means-update heuristic cannot tell create from update.
        // Try the update first and insert when no row matched.
        let active_model: A = entity.into();
        match active_model.clone().update(&self.db).await {
            Ok(model) => Ok(model.into()),
            Err(DbErr::RecordNotUpdated) => {
                let model = active_model.insert(&self.db).await.map_err(map_save_err)?;
                Ok(model.into())
            }
            Err(e) => Err(RepoError::Query(e.to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = <A::Entity as EntityTrait>::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
