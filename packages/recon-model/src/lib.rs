pub mod dataset;
pub mod entity;
pub mod schema;
pub mod types;

mod error;

pub use dataset::{Dataset, Datasets};
pub use entity::{EXAMPLE_ID, Entity, EntityExample, ExampleValues};
pub use error::{Error, Result};
pub use schema::{Model, Property, Schema};
pub use types::PropertyType;
