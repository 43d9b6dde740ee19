//! Object model: the object handle, its typed attributes and the bucket
//! facade that builds handles from resolved defaults.

pub mod attributes;
pub mod bucket;
pub mod metadata;
pub mod object;
