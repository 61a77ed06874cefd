//! Report delivery port trait.

use crate::domain::error::ScreenerError;

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

/// Port for delivering formatted reports. Failures surface as
/// `ScreenerError::Delivery` and are not fatal to a screening run.
pub trait NotifierPort {
    fn send(&self, notification: &Notification) -> Result<(), ScreenerError>;
}
