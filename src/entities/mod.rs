pub mod prelude;

pub mod authors;
pub mod book_authors;
pub mod book_categories;
pub mod books;
pub mod categories;
