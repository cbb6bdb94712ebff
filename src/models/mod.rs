pub mod confirmation;
pub mod policy;

pub use confirmation::{Confirmation, ConfirmationType};
pub use policy::AcceptPolicy;
