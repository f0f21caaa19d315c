//! Outbound notification port trait.

use crate::domain::error::KdtraderError;
use crate::domain::notification::Notification;

pub trait NotificationPort {
    fn deliver(&self, recipient: &str, notification: &Notification) -> Result<(), KdtraderError>;
}
