pub mod cosign;
pub mod distribute;
pub mod forks;
pub mod get;
pub mod keygen;
pub mod logs;
pub mod sign;
