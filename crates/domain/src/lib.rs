//! Core auction/bid value types, the lifecycle state machine, and the
//! error taxonomy shared by every other crate in this workspace. This
//! crate performs no I/O: it is safe to depend on from both the server
//! binary and from test code that never touches a database or a socket.

pub mod auction;
pub mod bid;
pub mod category;
pub mod clock;
pub mod error;
pub mod events;
pub mod ids;
pub mod lifecycle;
pub mod money;

pub use auction::{Auction, AuctionStatus};
pub use bid::Bid;
pub use category::Category;
pub use clock::{Clock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use events::Event;
pub use ids::{AuctionId, BidId, CategoryId, UserId};
