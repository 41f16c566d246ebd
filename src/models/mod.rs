pub mod credential;
pub mod document;
pub mod draft;
pub mod interaction;
