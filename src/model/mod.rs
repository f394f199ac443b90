pub mod figure;
pub mod schema;
pub mod style;
pub mod table;

pub use figure::Figure;
pub use schema::{Route, SchemaRegistry, SeriesChart, TableSchema};
pub use style::{StyleDescriptor, StyleTable, Visibility};
pub use table::{ReferencePrices, SeriesTable, SnapshotTable};
