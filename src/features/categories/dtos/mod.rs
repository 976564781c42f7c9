pub mod category_dto;

pub use category_dto::{
    CategoryFullDto, CategoryResponseDto, CategoryTreeDto, CreateCategoryDto,
    DeleteCategoryQuery, DeleteOutcome, ListCategoriesQuery, OrganizeReport, SaveCategoryDto,
    UpdateCategoryDto,
};
