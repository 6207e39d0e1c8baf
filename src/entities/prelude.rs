pub use super::authors::Entity as Authors;
pub use super::book_authors::Entity as BookAuthors;
pub use super::book_categories::Entity as BookCategories;
pub use super::books::Entity as Books;
pub use super::categories::Entity as Categories;
