//! Page Components

mod query;

pub use query::QueryPage;
