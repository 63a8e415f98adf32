pub mod basis_points;
pub mod units;

pub use basis_points::BasisPoints;
