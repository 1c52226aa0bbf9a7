pub mod driver;
pub mod live;
