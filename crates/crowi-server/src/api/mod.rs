pub mod backlinks;
