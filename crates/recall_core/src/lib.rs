pub mod domain;
pub mod memory;
pub mod ports;
pub mod practice;
pub mod review;
pub mod settings;
pub mod study;

pub use domain::{InvalidQuality, LearnableItem, Quality, ReviewLogEntry, ReviewPhase};
pub use memory::InMemoryItemRepository;
pub use ports::{ItemRepository, PortError, PortResult};
pub use practice::{process_practice_outcome, pull_practice, PracticeTier};
pub use review::{ease_penalty, process_outcome, pull_due};
pub use settings::SchedulerSettings;
pub use study::{ReviewOutcome, StudyError, StudyResult, StudyService};
