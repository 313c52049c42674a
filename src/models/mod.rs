pub mod catalog;
pub mod exam;
pub mod question;
