mod category;

#[cfg(test)]
pub use category::full_name;
pub use category::{Category, CategoryDetails, CategoryFull, NewCategory, FULL_NAME_SEPARATOR};
