pub mod apartment;
pub mod block;
pub mod charge;
pub mod import;
pub mod payment;
pub mod resident;

pub use apartment::*;
pub use block::*;
pub use charge::*;
pub use import::*;
pub use payment::*;
pub use resident::*;
