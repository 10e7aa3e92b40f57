pub mod autoplay;
pub mod chart;
pub mod gameplay;
pub mod judgment;
pub mod lane;
pub mod scores;
