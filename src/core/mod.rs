pub mod access_filter;
pub mod echo;
pub mod mock;
pub mod router;
pub mod sniff;
pub mod upstream;

pub use access_filter::DenyList;
pub use mock::{FixtureName, MockResolution};
pub use router::{Route, RouteError, RouteTable};
