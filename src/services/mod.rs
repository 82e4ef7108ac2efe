/// OpenAPI documentation generation.
pub mod documentation;
/// Group game turn coordination and timers.
pub mod group_service;
/// Guess submission and listing.
pub mod guess_service;
/// Health check service.
pub mod health_service;
/// Persisted move log queries.
pub mod history_service;
/// Team pairing logic and utilities.
pub mod pairing;
/// Solo session play.
pub mod solo_service;
/// Storage connection supervisor with backoff and degraded mode.
pub mod storage_supervisor;
/// End-of-game report assembly.
pub mod summary;
/// WebSocket connection and message handling service.
pub mod websocket_service;
