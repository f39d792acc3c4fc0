//! Feature modules (vertical slices)

pub mod linkage;
