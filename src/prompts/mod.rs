mod builder;
mod remote;
mod revision;
mod source;
pub mod templates;

pub use builder::{PromptBuilder, render};
pub use remote::RemoteTemplateSource;
pub use revision::CodeRevision;
pub use source::{DefaultTemplates, StaticTemplates, TemplateSource};
