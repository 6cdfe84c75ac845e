pub mod backlink;
pub mod page;
