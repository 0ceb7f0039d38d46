//! This crate provides the client-side core of a task manager that talks to a remote task service.
//!
//! Tasks are held in a local [`cache`], so that views can display them instantly. Every change goes through a
//! [`Provider`], that applies it to the cache right away, sends it to the server (through a [`TaskGateway`](traits::TaskGateway),
//! usually a [`client::Client`]), and then either reconciles the cache with the reply of the server, or rolls it back.
//! Views that render the same tasks stay in sync through a [`ChangeBroadcaster`](provider::broadcaster::ChangeBroadcaster).
//!
//! The [`calendar`] module lays tasks out in days, weeks and months.

pub mod traits;

pub mod task;
pub use task::{Task, TaskId, NewTask, TaskUpdate};
pub mod event;
pub use event::{ChangeEvent, ChangeKind};
pub mod provider;
pub use provider::{Provider, ProviderError};
pub use provider::broadcaster::{ChangeBroadcaster, Subscription};

pub mod cache;
pub mod calendar;
pub mod client;
pub mod config;
pub mod view;

pub mod mock_behaviour;
pub mod mock_gateway;

pub mod utils;

/// A [`Provider`] that talks to the actual task service
pub type RemoteProvider = Provider<client::Client>;
