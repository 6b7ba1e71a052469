pub mod address_book;
pub mod carts;
pub mod catalog;
pub mod orders;
