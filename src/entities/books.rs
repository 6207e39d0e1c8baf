use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stable volume id from the external source.
    #[sea_orm(unique)]
    pub book_id: String,

    pub title: Option<String>,

    pub published_date: Option<Date>,

    /// False when the source only gave a year, true for a full date.
    pub exact_date: bool,

    pub average_rating: Option<f64>,

    pub ratings_count: Option<i32>,

    pub thumbnail: Option<String>,

    pub created_date: DateTimeUtc,

    pub modified_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::book_authors::Entity")]
    BookAuthors,
    #[sea_orm(has_many = "super::book_categories::Entity")]
    BookCategories,
}

impl Related<super::book_authors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookAuthors.def()
    }
}

impl Related<super::book_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookCategories.def()
    }
}

impl Related<super::authors::Entity> for Entity {
    fn to() -> RelationDef {
        super::book_authors::Relation::Authors.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::book_authors::Relation::Books.def().rev())
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        super::book_categories::Relation::Categories.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::book_categories::Relation::Books.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
