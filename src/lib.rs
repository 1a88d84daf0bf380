//! Statecraft: finite-state actors with copy-on-write context
//!
//! Statecraft follows a "pure core, imperative shell" split. Machine
//! definitions, guards, actions and the transition engine are pure values and
//! functions. Asynchronous work lives in invocations, which are Stillwater
//! effects, and runs under an [`Actor`](actor::Actor) that serializes every
//! event through one mailbox.
//!
//! # Core Concepts
//!
//! - **State**: type-safe state enums via the `State` trait (or `state_enum!`)
//! - **Context**: data carried between transitions, updated copy-on-write
//! - **Guards**: pure predicates; the first passing candidate wins
//! - **Invocations**: effects started on state entry that report back as
//!   `Done` or `Error` signals; late results are discarded
//! - **Snapshots**: `{status, value, context, error}`, serializable and
//!   resumable
//!
//! # Example
//!
//! ```rust
//! use statecraft::actor::{Actor, ActorConfig};
//! use statecraft::builder::{transition, MachineBuilder, StateBuilder};
//! use statecraft::checkpoint::codec;
//! use statecraft::core::{Event, Signal};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! statecraft::state_enum! {
//!     enum Door {
//!         Closed => "closed",
//!         Open => "open",
//!     }
//! }
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
//! struct Visits {
//!     count: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum Knock {
//!     Open,
//!     Close,
//! }
//!
//! impl Event for Knock {
//!     fn name(&self) -> &str {
//!         match self {
//!             Self::Open => "OPEN",
//!             Self::Close => "CLOSE",
//!         }
//!     }
//! }
//!
//! let definition = MachineBuilder::<Door, Visits, Knock>::new("door")
//!     .initial(Door::Closed)
//!     .context(Visits { count: 0 })
//!     .state(
//!         Door::Closed,
//!         StateBuilder::new().on_with(
//!             "OPEN",
//!             transition(Door::Open)
//!                 .assign(|v: &mut Visits, _: &Signal<Knock>| v.count += 1),
//!         ),
//!     )
//!     .state(Door::Open, StateBuilder::new().on("CLOSE", Door::Closed))
//!     .build()
//!     .unwrap();
//! let definition = Arc::new(definition);
//!
//! let actor = Actor::new(Arc::clone(&definition), (), ActorConfig::default());
//! actor.start().unwrap();
//! actor.send(Knock::Open).unwrap();
//!
//! // persist, then pick up where we left off
//! let bytes = codec::serialize(&actor.get_snapshot()).unwrap();
//! let restored = Actor::from_snapshot(
//!     definition,
//!     (),
//!     ActorConfig::default(),
//!     codec::deserialize(&bytes).unwrap(),
//! )
//! .unwrap();
//! restored.start().unwrap();
//! restored.send(Knock::Close).unwrap();
//!
//! assert_eq!(restored.get_snapshot().value, Door::Closed);
//! assert_eq!(restored.get_snapshot().context, Visits { count: 1 });
//! ```

pub mod builder;
pub mod core;
pub mod definition;
pub mod effects;

pub mod actor;
pub mod checkpoint;
pub mod pipeline;

// Re-export commonly used types
pub use actor::{Actor, ActorConfig, ActorError, Snapshot, Status};
pub use builder::{transition, MachineBuilder, StateBuilder};
pub use core::{Context, Event, Guard, Signal, State, StateHistory, StateTransition};
pub use definition::MachineDefinition;
