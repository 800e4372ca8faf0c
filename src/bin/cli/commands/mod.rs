pub mod add;
pub mod cleanup;
pub mod due;
pub mod lookup;
pub mod review;
pub mod stats;
