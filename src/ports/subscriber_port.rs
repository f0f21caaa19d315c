//! Subscriber store port trait.

use crate::domain::error::KdtraderError;
use crate::domain::notification::Subscription;

pub trait SubscriberPort {
    fn subscriptions(&self) -> Result<Vec<Subscription>, KdtraderError>;
}
