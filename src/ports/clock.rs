//! Clock port. Domain operations take `now` explicitly; application
//! handlers obtain it here.

use crate::domain::foundation::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
