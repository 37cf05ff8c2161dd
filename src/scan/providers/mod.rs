pub mod demo;
pub mod fixture;

pub use demo::DemoInventoryProvider;
pub use fixture::JsonInventoryProvider;
