use crate::entities::{authors, prelude::*};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};

pub struct AuthorRepository;

impl AuthorRepository {
    /// Resolves an author by unique name, creating the row when absent.
    ///
    /// The insert carries ON CONFLICT DO NOTHING so a concurrent run that
    /// wins the unique-name race still resolves to the same row.
    pub async fn find_or_create<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> Result<authors::Model, DbErr> {
        if let Some(found) = Authors::find()
            .filter(authors::Column::Name.eq(name))
            .one(conn)
            .await?
        {
            return Ok(found);
        }

        Authors::insert(authors::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(authors::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

        Authors::find()
            .filter(authors::Column::Name.eq(name))
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("author '{name}' after upsert")))
    }
}
