pub mod session;

pub use session::{Artifact, ParseSessionNameError, Session, SessionName};
