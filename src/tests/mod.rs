pub mod stats_tests;
pub mod peer_tests;
pub mod contender_tests;
pub mod determinism_tests;
