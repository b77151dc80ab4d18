pub mod config;
pub mod notifier;
pub mod poller;
pub mod practicum;
pub mod verdict;
