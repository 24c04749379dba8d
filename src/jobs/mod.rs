pub mod collection;
pub mod filter;

pub use collection::{JobCollection, JobCollectionState, merge_jobs};
pub use filter::{FilterChip, FilterOptions, JobQuery, SalarySort, filter_jobs};
