pub mod model;
pub mod snowflake;
pub mod stats;
pub mod util;
