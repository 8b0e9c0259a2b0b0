pub mod analysis;
pub mod analysis_registry;
pub mod mock_analysis;
pub mod mood_journal;
pub mod mood_store;
pub mod mood_trend;
pub mod upload;
