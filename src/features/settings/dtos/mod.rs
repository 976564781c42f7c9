pub mod setting_dto;

pub use setting_dto::{SettingResponseDto, UpdateSettingDto};
