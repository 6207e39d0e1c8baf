use crate::entities::{categories, prelude::*};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};

pub struct CategoryRepository;

impl CategoryRepository {
    /// Resolves a category by unique name, creating the row when absent.
    /// Same race handling as the author upsert.
    pub async fn find_or_create<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> Result<categories::Model, DbErr> {
        if let Some(found) = Categories::find()
            .filter(categories::Column::Name.eq(name))
            .one(conn)
            .await?
        {
            return Ok(found);
        }

        Categories::insert(categories::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(categories::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

        Categories::find()
            .filter(categories::Column::Name.eq(name))
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("category '{name}' after upsert")))
    }
}
