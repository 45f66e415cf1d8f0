//! Session storage module.

mod wizard_session;

pub use wizard_session::WizardSessionStore;
