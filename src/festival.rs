pub mod crew;
pub mod export;
pub mod models;
pub mod normalize;
pub mod review;
pub mod score;
pub mod stats;
